//! Resilience primitives for inter-service calls.
//!
//! Every outbound call in this workspace goes through [`with_retry`]: a
//! bounded retry loop with a fixed inter-attempt delay. Only errors the
//! caller classifies as transient (via [`Transient`]) are retried; permanent
//! failures surface on the first attempt. The loop observes a
//! [`CancellationToken`] and stops immediately, including mid-sleep.

mod retry;

pub use retry::{with_retry, RetryConfig, RetryError, Transient};

pub use tokio_util::sync::CancellationToken;
