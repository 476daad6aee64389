//! Column model errors

/// Errors raised while normalizing column descriptors.
#[derive(Debug, thiserror::Error)]
pub enum ColumnError {
    /// Two descriptors resolved to the same column id.
    #[error("duplicate column id: {0}")]
    DuplicateId(String),

    /// A descriptor used an id reserved by the engine.
    #[error("column id is reserved: {0}")]
    ReservedId(String),
}
