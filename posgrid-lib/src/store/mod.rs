//! Persistence collaborators for preferences and presets.
//!
//! Provides the `PreferenceBackend` and `PresetBackend` traits plus two
//! implementations: an in-memory store and a SQLite store.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::identity::TableIdentity;
use crate::presets::NewPreset;
use crate::presets::Preset;
use crate::state::Preference;

/// Storage for per-user layout preferences.
#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    /// Load the preference stored for `identity`, if any.
    async fn load(&self, identity: &TableIdentity) -> Result<Option<Preference>, StoreError>;

    /// Insert or replace the preference for `identity`.
    async fn upsert(
        &self,
        identity: &TableIdentity,
        preference: &Preference,
    ) -> Result<(), StoreError>;
}

/// Storage for named presets.
///
/// `list` returns the role-scoped presets of the table and tenant plus the
/// user-scoped presets owned by `identity.user_id`, oldest first.
#[async_trait]
pub trait PresetBackend: Send + Sync {
    async fn list(&self, identity: &TableIdentity) -> Result<Vec<Preset>, StoreError>;

    async fn create(&self, identity: &TableIdentity, preset: NewPreset)
    -> Result<Preset, StoreError>;
}
