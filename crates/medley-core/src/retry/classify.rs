//! Map attempt errors to retry kinds.

use super::error::AttemptError;
use super::policy::ErrorKind;

/// Tool exits are retryable; supervisor faults are not (a missing binary
/// stays missing); cancellation is its own kind.
pub fn classify(e: &AttemptError) -> ErrorKind {
    match e {
        AttemptError::ToolFailed { .. } => ErrorKind::ToolFailed,
        AttemptError::Supervisor(_) => ErrorKind::Fatal,
        AttemptError::Cancelled => ErrorKind::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::SupervisorError;
    use std::io;

    #[test]
    fn kinds() {
        let failed = AttemptError::ToolFailed {
            program: "x".into(),
            code: Some(2),
            tail: Vec::new(),
        };
        assert_eq!(classify(&failed), ErrorKind::ToolFailed);

        let spawn = AttemptError::from(SupervisorError::Spawn {
            program: "x".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        });
        assert_eq!(classify(&spawn), ErrorKind::Fatal);
        assert_eq!(classify(&AttemptError::Cancelled), ErrorKind::Cancelled);
    }
}
