//! Batch planning: inputs to jobs.

use super::job::{BatchInput, Job, JobResult, Target};
use super::Engine;
use crate::status::Severity;
use crate::supervisor::Supervisor;
use crate::tools::{
    determine_tool, into_batches, is_video_playlist, listing_command, titles_from_listing, Tool,
};

pub(super) struct Plan {
    pub jobs: Vec<Job>,
    /// Inputs that failed before becoming jobs (playlist expansion).
    pub failures: Vec<JobResult>,
    /// Known up front when the batch consists only of title searches.
    pub fixed_total: Option<u64>,
}

/// Why a playlist could not be expanded. `Cancelled` yields no Result.
enum ExpandError {
    Cancelled,
    Failed(String),
}

struct Planner<'a> {
    engine: &'a Engine,
    playlist_name: Option<String>,
    next_id: usize,
    plan: Plan,
}

impl<'a> Planner<'a> {
    fn push(&mut self, target: Target, tool: Tool) {
        let id = self.next_id;
        self.next_id += 1;
        self.plan.jobs.push(Job {
            id,
            target,
            tool,
            playlist_name: self.playlist_name.clone(),
        });
    }

    fn push_titles(&mut self, titles: Vec<String>) {
        for batch in into_batches(titles, self.engine.config.batch_size) {
            self.push(Target::Titles(batch), Tool::Music);
        }
    }

    fn push_failure(&mut self, url: &str, message: String) {
        let id = self.next_id;
        self.next_id += 1;
        let job = Job {
            id,
            target: Target::Url(url.to_string()),
            tool: Tool::Video,
            playlist_name: self.playlist_name.clone(),
        };
        self.plan.failures.push(JobResult::failed(&job, 1, message));
    }

    fn add(&mut self, input: BatchInput) {
        match input {
            BatchInput::Url(url) => {
                let url = url.trim().to_string();
                if url.is_empty() {
                    return;
                }
                if is_video_playlist(&url) {
                    self.expand(&url);
                } else {
                    let tool = determine_tool(&url, self.engine.config.default_tool);
                    self.push(Target::Url(url), tool);
                }
            }
            // A forced video tool downloads the playlist as video instead of expanding it.
            BatchInput::Forced { url, tool } => {
                if tool == Tool::Music && is_video_playlist(&url) {
                    self.expand(&url);
                } else {
                    self.push(Target::Url(url), tool);
                }
            }
            BatchInput::Titles(titles) => {
                let titles: Vec<String> = titles
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                self.push_titles(titles);
            }
        }
    }

    fn expand(&mut self, url: &str) {
        let status = &self.engine.status;
        status.log(Severity::Info, format!("Listing playlist {url}"));
        match list_titles(self.engine, url) {
            Ok(titles) => {
                status.log(
                    Severity::Info,
                    format!("Playlist {url}: {} titles to search", titles.len()),
                );
                self.push_titles(titles);
            }
            Err(ExpandError::Cancelled) => {
                tracing::info!(url, "playlist listing cancelled");
            }
            Err(ExpandError::Failed(message)) => {
                status.log(Severity::Error, format!("Could not list playlist {url}: {message}"));
                self.push_failure(url, message);
            }
        }
    }
}

/// One metadata-only listing run of the video tool.
fn list_titles(engine: &Engine, url: &str) -> Result<Vec<String>, ExpandError> {
    let cmd = listing_command(&engine.config, url);
    let supervisor = Supervisor::new(&engine.stop, &engine.config.soft_success);
    let output = supervisor
        .run(&cmd, |_| {})
        .map_err(|e| ExpandError::Failed(e.to_string()))?;
    if output.cancelled {
        return Err(ExpandError::Cancelled);
    }
    // With --ignore-errors the tool may exit nonzero after listing the
    // available entries; any titles are good enough.
    let titles = titles_from_listing(&output.lines);
    if titles.is_empty() {
        let reason = match output.exit_code {
            Some(0) => "listing returned no titles".to_string(),
            Some(code) => format!("listing exited with code {code} and no titles"),
            None => "listing was killed".to_string(),
        };
        return Err(ExpandError::Failed(reason));
    }
    Ok(titles)
}

pub(super) fn plan_batch(
    engine: &Engine,
    inputs: Vec<BatchInput>,
    playlist_name: Option<&str>,
) -> Plan {
    let mut planner = Planner {
        engine,
        playlist_name: playlist_name.map(str::to_string),
        next_id: 0,
        plan: Plan {
            jobs: Vec::new(),
            failures: Vec::new(),
            fixed_total: None,
        },
    };
    for input in inputs {
        if engine.stop.is_stopped() {
            break;
        }
        planner.add(input);
    }

    let mut plan = planner.plan;
    let all_titles = !plan.jobs.is_empty()
        && plan
            .jobs
            .iter()
            .all(|j| matches!(j.target, Target::Titles(_)));
    if all_titles {
        let total: usize = plan
            .jobs
            .iter()
            .map(|j| match &j.target {
                Target::Titles(t) => t.len(),
                Target::Url(_) => 0,
            })
            .sum();
        plan.fixed_total = Some(total as u64);
    }
    plan
}
