//! Storage errors for preference and preset collaborators.

/// Errors that can occur while loading or persisting table state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite error.
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),

    /// Payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend rejected the request.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a backend error from any message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
