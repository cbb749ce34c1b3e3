//! Service layer
//!
//! Output storage, the diagram service facade, and prompt-driven generation.

mod diagram_service;
mod generate;
mod storage;

pub use diagram_service::*;
pub use generate::*;
pub use storage::*;
