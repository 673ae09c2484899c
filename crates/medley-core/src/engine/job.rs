//! Job, Result, and batch input model.

use serde::Serialize;

use crate::tools::Tool;

/// What a job fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Target {
    /// A single URL handed to the tool as-is.
    Url(String),
    /// Free-text search queries run in one music-tool invocation.
    Titles(Vec<String>),
}

impl Target {
    /// Short human-readable description for logs and status.
    pub fn label(&self) -> String {
        match self {
            Target::Url(url) => url.clone(),
            Target::Titles(titles) => match titles.first() {
                Some(first) if titles.len() > 1 => {
                    format!("{first} (+{} more)", titles.len() - 1)
                }
                Some(first) => first.clone(),
                None => "empty title batch".to_string(),
            },
        }
    }
}

/// One unit of work. Never mutated after planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Position in the batch; results are reported in this order.
    pub id: usize,
    pub target: Target,
    pub tool: Tool,
    pub playlist_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Failed,
}

/// Terminal record of a job. Cancelled jobs produce none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub job_id: usize,
    pub target: Target,
    pub tool: Tool,
    pub status: JobStatus,
    /// Between 1 and the configured maximum.
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,
}

impl JobResult {
    pub fn success(job: &Job, attempts: u32) -> Self {
        Self {
            job_id: job.id,
            target: job.target.clone(),
            tool: job.tool,
            status: JobStatus::Success,
            attempts,
            error_summary: None,
        }
    }

    pub fn failed(job: &Job, attempts: u32, summary: impl Into<String>) -> Self {
        Self {
            job_id: job.id,
            target: job.target.clone(),
            tool: job.tool,
            status: JobStatus::Failed,
            attempts: attempts.max(1),
            error_summary: Some(summary.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}

/// One element of a `process_batch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInput {
    /// Tool picked from the URL's host.
    Url(String),
    /// Caller-chosen tool.
    Forced { url: String, tool: Tool },
    /// Pre-extracted search titles for the music tool.
    Titles(Vec<String>),
}

impl From<&str> for BatchInput {
    fn from(url: &str) -> Self {
        BatchInput::Url(url.to_string())
    }
}

impl From<String> for BatchInput {
    fn from(url: String) -> Self {
        BatchInput::Url(url)
    }
}

/// Outcome counts of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Planned jobs with no Result (cancelled).
    pub dropped: usize,
}

impl BatchReport {
    pub fn from_results(planned_jobs: usize, results: &[JobResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        Self {
            succeeded,
            failed,
            dropped: planned_jobs.saturating_sub(results.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(target: Target) -> Job {
        Job {
            id: 3,
            target,
            tool: Tool::Music,
            playlist_name: None,
        }
    }

    #[test]
    fn labels() {
        assert_eq!(Target::Url("https://x".into()).label(), "https://x");
        assert_eq!(Target::Titles(vec!["a".into()]).label(), "a");
        assert_eq!(
            Target::Titles(vec!["a".into(), "b".into(), "c".into()]).label(),
            "a (+2 more)"
        );
    }

    #[test]
    fn failed_result_has_at_least_one_attempt() {
        let r = JobResult::failed(&job(Target::Url("u".into())), 0, "boom");
        assert_eq!(r.attempts, 1);
        assert!(!r.is_success());
    }

    #[test]
    fn report_counts_dropped() {
        let j = job(Target::Url("u".into()));
        let results = vec![JobResult::success(&j, 1), JobResult::failed(&j, 2, "x")];
        assert_eq!(
            BatchReport::from_results(5, &results),
            BatchReport {
                succeeded: 1,
                failed: 1,
                dropped: 3
            }
        );
    }

    #[test]
    fn result_json_shape() {
        let r = JobResult::success(&job(Target::Titles(vec!["t".into()])), 1);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains(r#""status":"success""#));
        assert!(json.contains(r#""target":{"kind":"titles","value":["t"]}"#));
        assert!(!json.contains("error_summary"));
    }
}
