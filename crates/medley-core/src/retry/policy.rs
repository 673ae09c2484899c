use std::time::Duration;

use crate::config::RetryConfig;

/// Classification of a failed attempt for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tool ran and exited unsuccessfully; worth another attempt.
    ToolFailed,
    /// Could not run the tool at all (spawn or read failure).
    Fatal,
    /// Stop was requested during the attempt.
    Cancelled,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Fixed-backoff policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay between a failed attempt and the next one.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Policy from config; zero attempts is treated as one.
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.attempts.max(1),
            backoff: Duration::from_secs(cfg.backoff_seconds),
        }
    }

    /// `attempt` is 1-based. Only tool failures below the attempt cap are retried.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        match kind {
            ErrorKind::ToolFailed => RetryDecision::RetryAfter(self.backoff),
            ErrorKind::Fatal | ErrorKind::Cancelled => RetryDecision::NoRetry,
        }
    }
}
