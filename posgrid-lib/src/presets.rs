//! Named table presets.

use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use chrono::SubsecRound;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::error::PresetError;
use crate::identity::TableIdentity;
use crate::state::PresetSnapshot;
use crate::store::PresetBackend;

/// Who a preset is shared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresetScope {
    /// Visible to the user who saved it.
    User,
    /// Visible to every user of the tenant.
    Role,
}

impl PresetScope {
    /// Stored and serialized name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Role => "ROLE",
        }
    }
}

impl fmt::Display for PresetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A saved preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub scope: PresetScope,
    pub state: PresetSnapshot,
    /// User id of the author.
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// A preset about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPreset {
    pub name: String,
    pub scope: PresetScope,
    pub state: PresetSnapshot,
}

impl Preset {
    /// Assign an id and creation time to a new preset.
    ///
    /// The timestamp is truncated to milliseconds, the precision stores keep.
    pub fn from_new(preset: NewPreset, owner: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: preset.name,
            scope: preset.scope,
            state: preset.state,
            owner,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}

/// The preset list of one table identity, plus save rules.
pub struct PresetStore {
    backend: Arc<dyn PresetBackend>,
    role_allowlist: Vec<String>,
    presets: Vec<Preset>,
    loaded: bool,
}

impl PresetStore {
    pub fn new(backend: Arc<dyn PresetBackend>, role_allowlist: Vec<String>) -> Self {
        Self {
            backend,
            role_allowlist,
            presets: Vec::new(),
            loaded: false,
        }
    }

    /// Reload the list. A failure leaves the list empty and is only logged.
    pub async fn reload(&mut self, identity: &TableIdentity) {
        match self.backend.list(identity).await {
            Ok(presets) => {
                log::debug!("Loaded {} presets for {}", presets.len(), identity);
                self.presets = presets;
            }
            Err(e) => {
                log::warn!("Failed to load presets for {}: {}", identity, e);
                self.presets.clear();
            }
        }
        self.loaded = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn find(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|preset| preset.id == id)
    }

    /// User presets are always allowed; role presets need an allow-listed role.
    pub fn can_save(&self, scope: PresetScope, role: Option<&str>) -> bool {
        match scope {
            PresetScope::User => true,
            PresetScope::Role => role.is_some_and(|role| {
                self.role_allowlist
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(role))
            }),
        }
    }

    /// Save a snapshot under `name`, then reload the list.
    ///
    /// On error the list is left unchanged.
    pub async fn save(
        &mut self,
        identity: &TableIdentity,
        role: Option<&str>,
        name: &str,
        scope: PresetScope,
        state: PresetSnapshot,
    ) -> Result<Preset, PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        if !self.can_save(scope, role) {
            return Err(PresetError::ScopeNotPermitted {
                scope,
                role: role.map(str::to_string),
            });
        }

        let preset = self
            .backend
            .create(
                identity,
                NewPreset {
                    name: name.to_string(),
                    scope,
                    state,
                },
            )
            .await?;
        log::debug!("Saved preset {:?} ({:?}) for {}", preset.name, scope, identity);

        self.reload(identity).await;
        Ok(preset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn store() -> PresetStore {
        PresetStore::new(
            Arc::new(InMemoryStore::new()),
            vec!["admin".to_string(), "manager".to_string()],
        )
    }

    fn identity(user: &str) -> TableIdentity {
        TableIdentity::new("tbl_menu", "acme", user)
    }

    #[test]
    fn test_scope_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&PresetScope::Role).unwrap(), "\"ROLE\"");
    }

    #[test]
    fn test_can_save() {
        let store = store();
        assert!(store.can_save(PresetScope::User, None));
        assert!(store.can_save(PresetScope::Role, Some("Manager")));
        assert!(!store.can_save(PresetScope::Role, Some("cashier")));
        assert!(!store.can_save(PresetScope::Role, None));
    }

    #[tokio::test]
    async fn test_save_reloads_list() {
        let mut store = store();
        let ann = identity("ann");
        store.reload(&ann).await;
        assert!(store.presets().is_empty());

        let saved = store
            .save(&ann, None, " Lunch ", PresetScope::User, PresetSnapshot::default())
            .await
            .unwrap();
        assert_eq!(saved.name, "Lunch");
        assert_eq!(saved.owner, "ann");
        assert_eq!(store.presets().len(), 1);
        assert!(store.find(&saved.id).is_some());
    }

    #[tokio::test]
    async fn test_role_presets_are_shared() {
        let backend = Arc::new(InMemoryStore::new());
        let allow = vec!["admin".to_string()];
        let mut ann = PresetStore::new(backend.clone(), allow.clone());
        ann.save(&identity("ann"), Some("admin"), "Shared", PresetScope::Role, PresetSnapshot::default())
            .await
            .unwrap();
        ann.save(&identity("ann"), Some("admin"), "Mine", PresetScope::User, PresetSnapshot::default())
            .await
            .unwrap();

        let mut bob = PresetStore::new(backend, allow);
        bob.reload(&identity("bob")).await;
        let names: Vec<&str> = bob.presets().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Shared"]);
    }

    #[tokio::test]
    async fn test_rejected_save_keeps_list() {
        let mut store = store();
        let ann = identity("ann");

        let err = store
            .save(&ann, Some("cashier"), "Team", PresetScope::Role, PresetSnapshot::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PresetError::ScopeNotPermitted { .. }));

        let err = store
            .save(&ann, None, "   ", PresetScope::User, PresetSnapshot::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PresetError::EmptyName));
        assert!(store.presets().is_empty());
    }
}
