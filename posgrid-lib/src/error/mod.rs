//! Error types

mod column;
mod preset;
mod store;

pub use column::*;
pub use preset::*;
pub use store::*;
