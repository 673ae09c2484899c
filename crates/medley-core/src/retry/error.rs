//! Attempt error type for retry classification.

use crate::supervisor::SupervisorError;

/// Why one attempt did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// The tool ran and exited unsuccessfully. `tail` holds its last output lines.
    #[error("{program} exited with {}", exit_label(.code))]
    ToolFailed {
        program: String,
        code: Option<i32>,
        tail: Vec<String>,
    },
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error("attempt cancelled")]
    Cancelled,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
    }
}

impl AttemptError {
    /// One-paragraph description for a failed Result: message plus output tail.
    pub fn summary(&self) -> String {
        match self {
            AttemptError::ToolFailed { tail, .. } if !tail.is_empty() => {
                format!("{self}\n{}", tail.join("\n"))
            }
            _ => self.to_string(),
        }
    }
}
