//! # Courier Scheduler
//!
//! Deferred delivery of postponed messages.
//!
//! A message created with a `postponed_at` instant is held back until that
//! instant and then handed to the [`Notifier`](courier_protocols::Notifier)
//! exactly once. The scheduler keeps one in-memory job per message and
//! rebuilds that table from the store on every start.
//!
//! ## Key Components
//!
//! - [`JobRegistry`]: message id to pending timer, guarded by a mutex
//! - [`TimerEngine`] / [`TokioTimerEngine`]: one-shot timers with pre-fire cancellation
//! - [`Scheduler`]: schedule/cancel, fire-time delivery, recovery, cascades
//!
//! ## Flow
//!
//! ```text
//! schedule_message(id, at) ──► registry[id] = timer ──► timer fires at `at`
//!                                                        │
//!            claim registry[id] ◄────────────────────────┘
//!            reload message ─► clear postponed_at ─► Notifier::deliver(owner, message)
//!
//! cancel_message_schedule(id) ──► remove registry[id] ──► cancel timer
//! ```
//!
//! Whichever of "fire" and "cancel" removes the registry entry first wins;
//! the other observes an absent entry and does nothing.

mod cascade;
mod delivery;
pub mod error;
pub mod recovery;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod timer;

#[cfg(test)]
mod test_support;

pub use error::{ScheduleError, TimerError};
pub use recovery::RecoveryReport;
pub use registry::JobRegistry;
pub use scheduler::Scheduler;
pub use stats::{SchedulerStats, SchedulerStatsSnapshot};
pub use timer::{JobId, TimerEngine, TimerHandle, TimerTask, TokioTimerEngine};
