//! Message and application definitions.
//!
//! The scheduler only looks at `id`, `application_id` and `postponed_at`;
//! everything else is payload carried through to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ApplicationId, Extras, MessageId, UserId};

/// A persisted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    /// Application the message was sent through.
    pub application_id: ApplicationId,

    pub title: String,

    pub message: String,

    pub priority: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,

    /// Creation time.
    pub date: DateTime<Utc>,

    /// Delivery is held back until this instant. `None` means deliverable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postponed_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Whether the message is waiting for a deferred delivery.
    pub fn is_postponed(&self) -> bool {
        self.postponed_at.is_some()
    }
}

/// A message as submitted, before the store assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    /// Falls back to the application name when empty.
    #[serde(default)]
    pub title: String,

    pub message: String,

    /// Falls back to the application's default priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postponed_at: Option<DateTime<Utc>>,
}

impl NewMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = Some(extras);
        self
    }

    pub fn postponed_until(mut self, at: DateTime<Utc>) -> Self {
        self.postponed_at = Some(at);
        self
    }

    /// Materialize into a stored message for application `application_id`.
    ///
    /// `title` and `priority` must already have their defaults applied.
    pub fn into_message(
        self,
        id: MessageId,
        application_id: ApplicationId,
        date: DateTime<Utc>,
    ) -> Message {
        Message {
            id,
            application_id,
            title: self.title,
            message: self.message,
            priority: self.priority.unwrap_or_default(),
            extras: self.extras,
            date,
            postponed_at: self.postponed_at,
        }
    }
}

/// An application: the sending side of messages, owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub default_priority: i32,
}

impl Application {
    pub fn new(id: ApplicationId, user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            name: name.into(),
            default_priority: 0,
        }
    }

    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.default_priority = priority;
        self
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
