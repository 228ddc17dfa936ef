// crates/resilience/src/lib.rs
//! Resilience patterns for fault-tolerant upload operations
//!
//! Currently this is retry with exponential backoff and jitter, used by the
//! full-sync engine when a bulk upsert batch fails transiently.
//!
//! # Example
//!
//! ```rust
//! use billstage_resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3)
//!     .with_initial_delay(Duration::from_millis(500))
//!     .with_max_delay(Duration::from_secs(10));
//! assert_eq!(policy.max_attempts(), 3);
//! ```

mod error;
mod retry;

pub use error::{ResilienceError, ResilienceResult};
pub use retry::{with_retry, RetryPolicy};
