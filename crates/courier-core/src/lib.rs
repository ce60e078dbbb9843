//! # Courier Core
//!
//! Request-side message flows built on the scheduler.
//!
//! - [`MessageService`] - create, postpone, un-postpone and delete messages
//!   while keeping the scheduler's job table in step with the store

pub mod error;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use service::MessageService;
