//! In-memory store implementation using DashMap

use async_trait::async_trait;
use dashmap::DashMap;

use super::PreferenceBackend;
use super::PresetBackend;
use crate::error::StoreError;
use crate::identity::TableIdentity;
use crate::presets::NewPreset;
use crate::presets::Preset;
use crate::presets::PresetScope;
use crate::state::Preference;

/// Preferences and presets held in concurrent hash maps.
///
/// Data is lost when the process exits.
///
/// # Example
///
/// ```
/// use posgrid_lib::store::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    preferences: DashMap<TableIdentity, Preference>,
    /// Keyed by `(table_id, tenant_id)`.
    presets: DashMap<(String, String), Vec<Preset>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored preferences.
    pub fn preference_count(&self) -> usize {
        self.preferences.len()
    }

    /// Number of stored presets across all tables.
    pub fn preset_count(&self) -> usize {
        self.presets.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.preference_count() == 0 && self.preset_count() == 0
    }
}

fn table_key(identity: &TableIdentity) -> (String, String) {
    (identity.table_id.clone(), identity.tenant_id.clone())
}

#[async_trait]
impl PreferenceBackend for InMemoryStore {
    async fn load(&self, identity: &TableIdentity) -> Result<Option<Preference>, StoreError> {
        Ok(self
            .preferences
            .get(identity)
            .map(|entry| entry.value().clone()))
    }

    async fn upsert(
        &self,
        identity: &TableIdentity,
        preference: &Preference,
    ) -> Result<(), StoreError> {
        self.preferences
            .insert(identity.clone(), preference.clone());
        Ok(())
    }
}

#[async_trait]
impl PresetBackend for InMemoryStore {
    async fn list(&self, identity: &TableIdentity) -> Result<Vec<Preset>, StoreError> {
        let Some(entry) = self.presets.get(&table_key(identity)) else {
            return Ok(Vec::new());
        };
        Ok(entry
            .value()
            .iter()
            .filter(|preset| preset.scope == PresetScope::Role || preset.owner == identity.user_id)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        identity: &TableIdentity,
        preset: NewPreset,
    ) -> Result<Preset, StoreError> {
        let preset = Preset::from_new(preset, identity.user_id.clone());
        self.presets
            .entry(table_key(identity))
            .or_default()
            .push(preset.clone());
        Ok(preset)
    }
}
