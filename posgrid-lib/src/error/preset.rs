//! Preset errors

use crate::presets::PresetScope;

use super::StoreError;

/// Errors returned when saving a preset.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    /// The acting role may not save presets with this scope.
    #[error("role {role:?} may not save {scope:?} presets")]
    ScopeNotPermitted {
        /// Requested scope.
        scope: PresetScope,
        /// Acting user's role, if known.
        role: Option<String>,
    },

    /// Preset names must contain at least one non-whitespace character.
    #[error("preset name is empty")]
    EmptyName,

    /// Presets are disabled for this table.
    #[error("presets are not enabled for this table")]
    Disabled,

    /// The preset backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
