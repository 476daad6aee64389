//! Table engine for POS admin screens
//!
//! A generic, virtualized data table with local or remote row computation,
//! debounced per-user layout persistence, and named presets.

pub mod column;
pub mod config;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod identity;
pub mod mode;
pub mod pipeline;
pub mod preferences;
pub mod presets;
pub mod query;
pub mod selection;
pub mod state;
pub mod store;
pub mod virtualizer;

mod engine;
mod row;

pub use engine::*;
pub use row::CellValue;
pub use row::TableRow;
