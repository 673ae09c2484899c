//! Retry policy for job attempts.
//!
//! A job is attempted up to `max_attempts` times with a fixed backoff
//! between failures. Attempt errors are classified first: tool failures
//! are retried, supervisor faults (missing binary, unreadable output) are
//! not, and cancellation ends the loop without a terminal outcome.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::classify;
pub use error::AttemptError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryOutcome};
