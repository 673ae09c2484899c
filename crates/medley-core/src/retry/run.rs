//! Retry loop: run attempts until success, exhaustion, or stop.

use super::classify::classify;
use super::error::AttemptError;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};
use crate::control::StopController;

/// Terminal outcome of a retry loop.
#[derive(Debug)]
pub enum RetryOutcome {
    Succeeded { attempts: u32 },
    Failed { attempts: u32, error: AttemptError },
    /// Stop observed; the job gets no Result.
    Cancelled { attempts: u32 },
}

/// Runs `f(attempt)` (1-based) until it succeeds or the policy says to stop.
/// The backoff sleep is interruptible; a stop observed before, during, or
/// after an attempt yields `Cancelled`.
pub fn run_with_retry<F>(policy: &RetryPolicy, stop: &StopController, mut f: F) -> RetryOutcome
where
    F: FnMut(u32) -> Result<(), AttemptError>,
{
    let mut attempt = 1u32;
    loop {
        if stop.is_stopped() {
            return RetryOutcome::Cancelled {
                attempts: attempt - 1,
            };
        }
        let err = match f(attempt) {
            Ok(()) => return RetryOutcome::Succeeded { attempts: attempt },
            Err(e) => e,
        };
        let kind = classify(&err);
        if kind == ErrorKind::Cancelled || stop.is_stopped() {
            return RetryOutcome::Cancelled { attempts: attempt };
        }
        match policy.decide(attempt, kind) {
            RetryDecision::NoRetry => {
                return RetryOutcome::Failed {
                    attempts: attempt,
                    error: err,
                }
            }
            RetryDecision::RetryAfter(d) => {
                tracing::warn!(
                    attempt,
                    max = policy.max_attempts,
                    "attempt failed: {err}; retrying in {}s",
                    d.as_secs()
                );
                if !stop.sleep_unless_stopped(d) {
                    return RetryOutcome::Cancelled { attempts: attempt };
                }
                attempt += 1;
            }
        }
    }
}
