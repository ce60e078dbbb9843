//! Dispatch sink protocol.

use async_trait::async_trait;

use crate::message::Message;
use crate::types::UserId;

/// Pushes a message to the live subscribers of a user.
///
/// Delivery is fire-and-forget: a user without subscribers simply misses the
/// live push, the message itself stays in the store.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, owner: UserId, message: Message);
}
