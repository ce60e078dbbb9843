//! Per-user broadcast channels.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use courier_protocols::{Message, Notifier, UserId};

/// Fans messages out to the live streams of their owner.
pub struct StreamHub {
    channels: DashMap<UserId, broadcast::Sender<Message>>,
    capacity: usize,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Counters for [`StreamHub`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Messages pushed to at least one subscriber.
    pub delivered: u64,
    /// Messages for users with no subscriber.
    pub dropped: u64,
    /// Users with at least one open channel.
    pub users: usize,
}

impl StreamHub {
    /// Create a hub whose per-user channels hold `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Open a stream for `user_id`.
    pub fn subscribe(&self, user_id: UserId) -> Subscription {
        let receiver = self
            .channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        debug!("New stream for user {}", user_id);
        Subscription { user_id, receiver }
    }

    /// Number of open streams for `user_id`.
    pub fn subscriber_count(&self, user_id: UserId) -> usize {
        self.channels
            .get(&user_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            users: self.channels.len(),
        }
    }

    /// Push `message` to every stream of `owner`.
    ///
    /// Returns how many streams received it.
    pub fn push(&self, owner: UserId, message: Message) -> usize {
        let id = message.id;
        let sent = match self.channels.get(&owner) {
            Some(tx) => tx.send(message).unwrap_or(0),
            None => 0,
        };

        if sent == 0 {
            self.channels.remove_if(&owner, |_, tx| tx.receiver_count() == 0);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("No stream open for user {}, message {} not pushed", owner, id);
        } else {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            debug!("Pushed message {} to {} stream(s) of user {}", id, sent, owner);
        }
        sent
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Notifier for StreamHub {
    async fn deliver(&self, owner: UserId, message: Message) {
        self.push(owner, message);
    }
}

/// One open stream of a user.
pub struct Subscription {
    user_id: UserId,
    receiver: broadcast::Receiver<Message>,
}

impl Subscription {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Wait for the next message. Returns `None` once the hub is gone.
    ///
    /// A subscriber that falls behind by more than the channel capacity
    /// skips the messages it missed.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Stream of user {} lagged, {} message(s) skipped", self.user_id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<Message> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Stream of user {} lagged, {} message(s) skipped", self.user_id, skipped);
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
