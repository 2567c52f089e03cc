//! Retry policy and backoff bookkeeping for upstream calls
//!
//! Two kinds of failed attempt are retried:
//!
//! - **Throttled** (HTTP 429): wait for the server-supplied `Retry-After`
//!   delay. The exponential backoff is left untouched.
//! - **Transient** (any other error status, or a transport failure): wait the
//!   current backoff, then double it.
//!
//! [`RetryState`] is the per-call state machine. It performs no I/O and no
//! sleeping; the client asks it what to do after each failed attempt.

use std::time::Duration;

use riftscore_core::config::RateLimitingConfig;

use crate::RiotError;

/// Attempts per call when nothing else is configured
pub const DEFAULT_MAX_RETRIES: u32 = 6;

/// First transient backoff delay
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Throttle delay when a 429 carries no usable `Retry-After`
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

// ============================================================================
// RetryPolicy
// ============================================================================

/// Retry budget and delays applied to every call of a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call (not retries after the first). Never below 1.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub default_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            default_retry_after: DEFAULT_RETRY_AFTER,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RateLimitingConfig) -> Self {
        let default_retry_after = if config.default_retry_after_secs.is_finite()
            && config.default_retry_after_secs >= 0.0
        {
            Duration::from_secs_f64(config.default_retry_after_secs)
        } else {
            DEFAULT_RETRY_AFTER
        };

        Self {
            max_retries: config.max_retries.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            default_retry_after,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_default_retry_after(mut self, delay: Duration) -> Self {
        self.default_retry_after = delay;
        self
    }

    /// Effective attempt budget.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

// ============================================================================
// Backoff
// ============================================================================

/// Exponential backoff that only grows on transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration) -> Self {
        Self { current: initial }
    }

    /// The delay the next transient failure would use.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Returns the current delay and doubles it for next time.
    pub fn next_transient(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2);
        delay
    }
}

// ============================================================================
// Attempt outcomes and trace
// ============================================================================

/// Why an attempt did not produce a usable response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// HTTP 429, with the delay the server asked for (or the default)
    Throttled { retry_after: Duration },
    /// Any other non-success status
    Status(u16),
    /// No response: connect, timeout or body read failure
    Transport(String),
}

impl AttemptFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            AttemptFailure::Throttled { .. } => Some(429),
            AttemptFailure::Status(status) => Some(*status),
            AttemptFailure::Transport(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AttemptFailure::Throttled { .. } => "HTTP 429".to_string(),
            AttemptFailure::Status(status) => format!("HTTP {status}"),
            AttemptFailure::Transport(message) => format!("transport error: {message}"),
        }
    }

    /// The terminal error when this was the last attempt.
    pub fn into_exhausted(self, url: &str, attempts: u32) -> RiotError {
        match self {
            AttemptFailure::Throttled { .. } => RiotError::RateLimitedExhausted {
                url: url.to_string(),
                attempts,
            },
            other => RiotError::UpstreamUnavailable {
                url: url.to_string(),
                attempts,
                status: other.status(),
                last_error: other.describe(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepReason {
    Throttled,
    Transient,
}

impl SleepReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepReason::Throttled => "throttled",
            SleepReason::Transient => "transient",
        }
    }
}

/// One pause between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySleep {
    /// The attempt (1-based) that failed
    pub attempt: u32,
    pub reason: SleepReason,
    pub delay: Duration,
    pub status: Option<u16>,
}

/// What happened inside one logical call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryTrace {
    pub attempts: u32,
    pub sleeps: Vec<RetrySleep>,
    /// Backoff value left over when the call ended
    pub final_backoff: Duration,
}

impl RetryTrace {
    pub fn delays(&self, reason: SleepReason) -> Vec<Duration> {
        self.sleeps
            .iter()
            .filter(|s| s.reason == reason)
            .map(|s| s.delay)
            .collect()
    }

    pub fn total_sleep(&self) -> Duration {
        self.sleeps.iter().map(|s| s.delay).sum()
    }
}

// ============================================================================
// RetryState
// ============================================================================

/// Per-call retry state machine
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    backoff: Backoff,
    trace: RetryTrace,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        let backoff = Backoff::new(policy.initial_backoff);
        Self {
            policy,
            backoff,
            trace: RetryTrace::default(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn backoff(&self) -> Duration {
        self.backoff.current()
    }

    /// Records failed attempt number `attempt` (1-based).
    ///
    /// Returns the pause before the next attempt, or `None` once the budget
    /// is spent. No pause follows the final attempt.
    pub fn on_failure(&mut self, attempt: u32, failure: &AttemptFailure) -> Option<RetrySleep> {
        self.trace.attempts = attempt;
        if attempt >= self.policy.attempts() {
            return None;
        }

        let sleep = match failure {
            AttemptFailure::Throttled { retry_after } => RetrySleep {
                attempt,
                reason: SleepReason::Throttled,
                delay: *retry_after,
                status: Some(429),
            },
            other => RetrySleep {
                attempt,
                reason: SleepReason::Transient,
                delay: self.backoff.next_transient(),
                status: other.status(),
            },
        };
        self.trace.sleeps.push(sleep.clone());
        Some(sleep)
    }

    /// Records the attempt that ended the call without a retryable failure.
    pub fn on_settled(&mut self, attempt: u32) {
        self.trace.attempts = attempt;
    }

    pub fn into_trace(mut self) -> RetryTrace {
        self.trace.final_backoff = self.backoff.current();
        self.trace
    }
}
