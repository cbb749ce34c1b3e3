//! Node resolution
//!
//! Turns the node types named in a specification into drawable classes:
//! the registry of drawing primitives, a memoizing loader over it, and the
//! resolver that tolerates near-miss type names.

mod class;
mod loader;
mod resolver;

pub use class::*;
pub use loader::*;
pub use resolver::*;
