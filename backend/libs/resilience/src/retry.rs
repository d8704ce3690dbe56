/// Bounded retry with a fixed inter-attempt delay
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Classifies an error as retryable or not.
///
/// Transient: 5xx responses, timeouts, connection resets. Permanent: 4xx
/// responses, undecodable bodies. Permanent errors are surfaced on the first
/// attempt without sleeping.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial call
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: E },
    #[error("permanent failure: {0}")]
    Permanent(E),
    #[error("operation cancelled")]
    Cancelled,
}

impl<E> RetryError<E> {
    /// The underlying error, when one was observed.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::RetriesExhausted { last, .. } => Some(last),
            RetryError::Permanent(e) => Some(e),
            RetryError::Cancelled => None,
        }
    }
}

/// Execute a fallible future with bounded, fixed-delay retry.
///
/// Retries only errors whose [`Transient::is_transient`] returns true, up to
/// `config.max_retries` additional attempts. Cancelling `cancel` aborts the
/// loop immediately, without finishing an in-progress sleep.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut f: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + std::fmt::Display,
{
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_transient() => return Err(RetryError::Permanent(e)),
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    warn!(
                        max_retries = config.max_retries,
                        error = %e,
                        "retries exhausted"
                    );
                    return Err(RetryError::RetriesExhausted { attempts: attempt, last: e });
                }

                warn!(
                    attempt,
                    max_retries = config.max_retries,
                    delay_ms = config.delay.as_millis() as u64,
                    error = %e,
                    "transient failure, retrying"
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(config.delay) => {}
                }
            }
        }
    }
}
