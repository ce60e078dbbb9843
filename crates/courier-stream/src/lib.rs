//! Live push hub for Courier.
//!
//! Each user with at least one open stream gets a broadcast channel; every
//! subscriber of that user receives every message delivered to them.
//! Nothing is buffered for users without subscribers.

mod hub;

pub use hub::{StreamHub, StreamStats, Subscription};
