//! Rendering
//!
//! The render pipeline, the Graphviz drawing backend, and the result type
//! every render reports.

mod graphviz;
mod pipeline;
mod result;

pub use graphviz::*;
pub use pipeline::*;
pub use result::*;
