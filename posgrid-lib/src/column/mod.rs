//! Column descriptors and the normalized column tree.

mod descriptor;
mod model;

pub use descriptor::*;
pub use model::*;
