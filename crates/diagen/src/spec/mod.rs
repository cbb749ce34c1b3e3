//! Diagram specifications
//!
//! The parsed model of a diagram and the validator that checks it before
//! rendering.

mod model;
mod validator;

pub use model::*;
pub use validator::*;
