//! Message store backends for Courier.
//!
//! Both backends implement [`MessageStore`](courier_protocols::MessageStore)
//! and [`ApplicationDirectory`](courier_protocols::ApplicationDirectory):
//!
//! - [`MemoryMessageStore`] keeps everything in process memory
//! - [`SqliteMessageStore`] persists to a SQLite file

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryMessageStore;
pub use sqlite::SqliteMessageStore;
