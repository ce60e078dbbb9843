//! Job registry: message id to pending timer handle.
//!
//! Pure bookkeeping, no I/O. Every operation takes the registry lock, so the
//! fire-time callback and request handlers can mutate it concurrently.
//! Removing an absent id is a no-op.

use std::collections::HashMap;

use parking_lot::Mutex;

use courier_protocols::MessageId;

use crate::timer::{JobId, TimerHandle};

/// In-memory table of scheduled jobs. Never persisted.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<MessageId, TimerHandle>>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` for `id`, returning the handle it displaced.
    pub fn put(&self, id: MessageId, handle: TimerHandle) -> Option<TimerHandle> {
        self.jobs.lock().insert(id, handle)
    }

    /// Create a handle with `make` and store it for `id` while holding the
    /// lock, so a timer that fires immediately still finds its entry.
    ///
    /// Returns the displaced handle. When `make` fails the registry is left
    /// untouched.
    pub fn put_with<E>(
        &self,
        id: MessageId,
        make: impl FnOnce() -> Result<TimerHandle, E>,
    ) -> Result<Option<TimerHandle>, E> {
        let mut jobs = self.jobs.lock();
        let handle = make()?;
        Ok(jobs.insert(id, handle))
    }

    /// Look up the handle for `id`.
    pub fn get(&self, id: MessageId) -> Option<TimerHandle> {
        self.jobs.lock().get(&id).cloned()
    }

    /// Remove the entry for `id`, if any.
    pub fn remove(&self, id: MessageId) -> Option<TimerHandle> {
        self.jobs.lock().remove(&id)
    }

    /// Remove the entry for `id` only if it belongs to `job`.
    ///
    /// Returns `false` when the entry is absent or owned by another job.
    pub fn remove_job(&self, id: MessageId, job: JobId) -> bool {
        let mut jobs = self.jobs.lock();
        match jobs.get(&id) {
            Some(handle) if handle.id() == job => {
                jobs.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Check whether `id` has a live job.
    pub fn contains(&self, id: MessageId) -> bool {
        self.jobs.lock().contains_key(&id)
    }

    /// Number of live jobs.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Check if there are no live jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Ids with a live job, in no particular order.
    pub fn ids(&self) -> Vec<MessageId> {
        self.jobs.lock().keys().copied().collect()
    }

    /// Remove and return every entry.
    pub fn drain(&self) -> Vec<(MessageId, TimerHandle)> {
        self.jobs.lock().drain().collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
