//! Common utilities shared across database implementations

pub mod error;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::{RetryConfig, retry, retry_notify, retry_when, retry_with_backoff};
