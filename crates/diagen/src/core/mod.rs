//! Core abstractions for diagram generation
//!
//! Shared types, configuration, errors, logging, and the drawing backend
//! traits the render pipeline is written against.

mod backend;
mod config;
mod error;
pub mod logging;
mod types;

pub use backend::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
