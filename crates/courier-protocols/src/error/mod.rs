//! Error types for the collaborator interfaces.

mod directory;
mod store;

pub use directory::*;
pub use store::*;
