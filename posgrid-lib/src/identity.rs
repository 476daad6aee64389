//! Table identity and session context.

use std::fmt;

use sha2::Digest;
use sha2::Sha256;

/// Tenant used when the session does not report one.
pub const DEFAULT_TENANT: &str = "default";

/// User used when the session does not report one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Provider of the acting tenant, user and role.
///
/// Injected by the host so the engine never reads ambient storage.
pub trait SessionContext: Send + Sync {
    fn tenant_id(&self) -> Option<String>;

    fn user_id(&self) -> Option<String>;

    /// Role of the acting user, used to gate role-scoped presets.
    fn role(&self) -> Option<String>;
}

/// A session with fixed values.
///
/// # Example
///
/// ```
/// use posgrid_lib::identity::{SessionContext, StaticSession};
///
/// let session = StaticSession::new("acme", "u-17").with_role("manager");
/// assert_eq!(session.role().as_deref(), Some("manager"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSession {
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub role: Option<String>,
}

impl StaticSession {
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            user_id: Some(user_id.into()),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

impl SessionContext for StaticSession {
    fn tenant_id(&self) -> Option<String> {
        self.tenant_id.clone()
    }

    fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn role(&self) -> Option<String> {
        self.role.clone()
    }
}

/// Key under which preferences and presets are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdentity {
    pub table_id: String,
    pub tenant_id: String,
    pub user_id: String,
}

impl TableIdentity {
    pub fn new(
        table_id: impl Into<String>,
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Resolve tenant and user from a session.
    pub fn for_session(table_id: impl Into<String>, session: &dyn SessionContext) -> Self {
        Self::new(
            table_id,
            session
                .tenant_id()
                .unwrap_or_else(|| DEFAULT_TENANT.to_string()),
            session
                .user_id()
                .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
        )
    }

    /// Flat key for key-value backends.
    pub fn storage_key(&self) -> String {
        format!("{}/{}/{}", self.table_id, self.tenant_id, self.user_id)
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// Derive a table id from the route it is mounted on and its leaf column keys.
///
/// Query strings, fragments and trailing slashes are ignored so the same
/// screen always maps to the same id.
pub fn derive_table_id<S: AsRef<str>>(route: &str, column_keys: &[S]) -> String {
    let path = route
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let keys: Vec<&str> = column_keys.iter().map(AsRef::as_ref).collect();
    let source = format!("{}::{}", path, keys.join(","));

    let digest = Sha256::digest(source.as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
    format!("tbl_{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_table_id_is_stable() {
        let a = derive_table_id("/inventory/items", &["sku", "name"]);
        let b = derive_table_id("/inventory/items/?page=2#top", &["sku", "name"]);
        assert_eq!(a, b);
        assert!(a.starts_with("tbl_"));
        assert_eq!(a.len(), 4 + 16);
    }

    #[test]
    fn test_derive_table_id_depends_on_columns() {
        let a = derive_table_id("/devices", &["serial", "name"]);
        let b = derive_table_id("/devices", &["name", "serial"]);
        let c = derive_table_id("/users", &["serial", "name"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_identity_falls_back_for_missing_session_values() {
        let identity = TableIdentity::for_session("tbl_x", &StaticSession::default());
        assert_eq!(identity.tenant_id, DEFAULT_TENANT);
        assert_eq!(identity.user_id, ANONYMOUS_USER);
        assert_eq!(identity.storage_key(), "tbl_x/default/anonymous");
    }
}
