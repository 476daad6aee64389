//! CLI errors

use posgrid_lib::error::ColumnError;
use posgrid_lib::error::PresetError;
use posgrid_lib::error::StoreError;

/// Errors surfaced to the command line.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid row file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Column(#[from] ColumnError),

    #[error(transparent)]
    Preset(#[from] PresetError),

    /// The row file is not an array of objects.
    #[error("expected a JSON array of objects")]
    NotRows,

    #[error("could not determine a data directory; pass --db")]
    NoDataDir,

    #[error("no preset named {0:?}")]
    PresetNotFound(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),
}
