//! Bounded exponential backoff around fallible async operations.
//!
//! A [`RetryPolicy`] describes how many attempts to make and how long to wait between them. It implements
//! [`BackoffBuilder`] so the actual loop is driven by `backon`; [`retry`] adds transient/permanent error
//! classification and reports whether a failure was retried to exhaustion.

use backon::{BackoffBuilder, Retryable};
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const MAX_JITTER_MS: u64 = 1_000;

/// Errors that may succeed if the same operation is attempted again.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for sqlx::Error {
    fn is_transient(&self) -> bool {
        match self {
            Self::Io(_) | Self::Tls(_) | Self::Protocol(_) | Self::PoolTimedOut => true,
            Self::Database(e) => e.code().is_some_and(|code| is_transient_sqlstate(&code)),
            _ => false,
        }
    }
}

/// SQLSTATE codes that signal a lost or refused connection rather than a bad request.
fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "53300" | "57P01" | "57P02" | "57P03" | "40001" | "40P01")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl RetryPolicy {
    /// Creates a policy without jitter. `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), initial_delay, max_delay, jitter: false }
    }

    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Deterministic delay before the retry that follows attempt `attempt` (0-based):
    /// `min(initial_delay * 2^attempt, max_delay)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay.checked_mul(factor).map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    fn jittered_delay_for(&self, attempt: u32) -> Duration {
        let base = self.delay_for(attempt);
        if !self.jitter {
            return base;
        }
        let offset = Duration::from_millis(rand::thread_rng().gen_range(0..MAX_JITTER_MS));
        base.saturating_add(offset).min(self.max_delay)
    }
}

/// Sequence of sleeps handed to `backon`; yields `max_attempts - 1` delays.
#[derive(Debug)]
pub struct Delays {
    policy: RetryPolicy,
    attempt: u32,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.attempt.saturating_add(1) >= self.policy.max_attempts {
            return None;
        }
        let delay = self.policy.jittered_delay_for(self.attempt);
        self.attempt += 1;
        Some(delay)
    }
}

impl BackoffBuilder for RetryPolicy {
    type Backoff = Delays;

    fn build(self) -> Self::Backoff {
        Delays { policy: self, attempt: 0 }
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a transient error.
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted { attempts: u32, source: E },
    /// The operation failed with an error that is not worth retrying.
    #[error("{0}")]
    Permanent(E),
}

impl<E> RetryError<E> {
    /// Returns the error observed on the last attempt.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { source, .. } | Self::Permanent(source) => source,
        }
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Runs `operation` until it succeeds, fails permanently, or `policy` runs out of attempts.
///
/// The operation must be safe to repeat.
///
/// # Errors
/// Returns [`RetryError::Permanent`] for the first non-transient failure and [`RetryError::Exhausted`]
/// with the last observed error once `policy.max_attempts()` transient failures have occurred.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let mut attempts: u32 = 0;
    let mut failed: u32 = 0;

    let result = (|| {
        attempts += 1;
        operation()
    })
    .retry(policy)
    .when(|e: &E| e.is_transient())
    .notify(|e: &E, delay: Duration| {
        failed += 1;
        tracing::warn!(
            error = %e,
            attempt = failed,
            max_attempts = policy.max_attempts(),
            delay_ms = %delay.as_millis(),
            "Transient failure, retrying"
        );
    })
    .await;

    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_transient() => Err(RetryError::Exhausted { attempts, source: e }),
        Err(e) => Err(RetryError::Permanent(e)),
    }
}
