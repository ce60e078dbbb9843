//! # Courier Protocols
//!
//! Domain types and collaborator interfaces for the Courier notification
//! service. Contains only definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`MessageStore`] - Persistence of messages, keyed by [`MessageId`]
//! - [`ApplicationDirectory`] - Resolves applications to their owning users
//! - [`Notifier`] - Live push of a message to a user's subscribers

pub mod directory;
pub mod error;
pub mod message;
pub mod notifier;
pub mod store;
pub mod types;

pub use directory::ApplicationDirectory;
pub use error::{DirectoryError, StoreError};
pub use message::{Application, Message, NewMessage};
pub use notifier::Notifier;
pub use store::MessageStore;
pub use types::*;
