use crate::FailureKind;
use std::time::Duration;

/// Decides whether a failed call is attempted again, and after how long.
///
/// Attempts are numbered from 1. `should_retry(n, kind)` is asked after
/// attempt `n` failed with `kind`; `delay_before_attempt(n)` is the pause
/// before attempt `n` starts. The transport never consults this itself.
pub trait RetryPolicy: Send + Sync {
    fn should_retry(&self, attempt: u32, failure: FailureKind) -> bool;

    fn delay_before_attempt(&self, attempt: u32) -> Duration;
}

/// Never retries.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn should_retry(&self, _attempt: u32, _failure: FailureKind) -> bool {
        false
    }

    fn delay_before_attempt(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Retries transient failures up to `max_attempts` total attempts with a
/// constant pause between them.
#[derive(Debug, Copy, Clone)]
pub struct FixedRetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl FixedRetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl RetryPolicy for FixedRetryPolicy {
    fn should_retry(&self, attempt: u32, failure: FailureKind) -> bool {
        failure.is_transient() && attempt < self.max_attempts
    }

    fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 { Duration::ZERO } else { self.delay }
    }
}

/// Retries transient failures with a delay that grows by `multiplier` after
/// every attempt, capped at `max_delay`.
#[derive(Debug, Copy, Clone)]
pub struct ExponentialBackoffRetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl ExponentialBackoffRetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            multiplier: 2.0,
            max_delay,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

impl RetryPolicy for ExponentialBackoffRetryPolicy {
    fn should_retry(&self, attempt: u32, failure: FailureKind) -> bool {
        failure.is_transient() && attempt < self.max_attempts
    }

    fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);

        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(scaled)
        }
    }
}
