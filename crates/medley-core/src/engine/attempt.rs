//! One job: command, retry loop, and output handling.

use super::job::{Job, JobResult, Target};
use super::Engine;
use crate::playlist::{PlaylistFile, PlaylistLayout};
use crate::retry::{run_with_retry, AttemptError, RetryOutcome, RetryPolicy};
use crate::status::Severity;
use crate::supervisor::Supervisor;
use crate::tools::{build_command, Tool, ToolCommand};

/// Output lines kept in a failed Result's summary.
const FAILURE_TAIL_LINES: usize = 10;

/// One subprocess run of a job.
struct Attempt<'a> {
    engine: &'a Engine,
    job: &'a Job,
    number: u32,
    command: &'a ToolCommand,
    /// Playlist to append finished items to, when the tool does not write it.
    manual_playlist: Option<&'a PlaylistFile>,
}

impl Attempt<'_> {
    fn run(&self) -> Result<(), AttemptError> {
        let engine = self.engine;
        tracing::debug!(job = self.job.id, attempt = self.number, command = %self.command, "attempt started");
        let supervisor = Supervisor::new(&engine.stop, &engine.config.soft_success);
        let output = supervisor.run(self.command, |line| self.handle_line(line))?;
        if output.cancelled {
            return Err(AttemptError::Cancelled);
        }
        if output.success {
            return Ok(());
        }
        let skip = output.lines.len().saturating_sub(FAILURE_TAIL_LINES);
        Err(AttemptError::ToolFailed {
            program: self.command.program.clone(),
            code: output.exit_code,
            tail: output.lines[skip..].to_vec(),
        })
    }

    fn handle_line(&self, line: &str) {
        let engine = self.engine;
        if !engine.parser.is_noise(line) {
            tracing::debug!(tool = %self.job.tool, "{line}");
        }
        let events = engine
            .parser
            .parse(line, self.job.tool, engine.status.state());
        engine.status.apply(&events);

        let (Some(playlist), Some(name)) = (self.manual_playlist, events.new_filename.as_deref())
        else {
            return;
        };
        let written = engine.locks.with_lock(playlist.path(), || {
            playlist.record_completion(name, engine.probe.as_ref())
        });
        if let Err(e) = written {
            tracing::warn!(playlist = %playlist.path().display(), "playlist append failed: {e}");
        }
    }
}

/// Runs a job to a terminal outcome; `None` when it was cancelled.
pub(super) fn run_job(engine: &Engine, job: &Job) -> Option<JobResult> {
    let config = &engine.config;
    let label = job.target.label();
    let layout = PlaylistLayout::new(&config.output_dir, job.playlist_name.as_deref());
    if let Err(e) = layout.ensure_dirs() {
        let message = format!("cannot create {}: {e}", layout.media_dir().display());
        engine.status.log(Severity::Error, format!("Failed {label}: {message}"));
        return Some(JobResult::failed(job, 1, message));
    }

    let command = build_command(config, job.tool, &job.target, &layout);
    let playlist = PlaylistFile::for_layout(&layout);
    // The music tool maintains its own playlist in URL (sync) mode.
    let native_playlist = job.tool == Tool::Music && matches!(job.target, Target::Url(_));
    let manual_playlist = playlist.as_ref().filter(|_| !native_playlist);

    engine.status.begin_job(&label);
    engine
        .status
        .log(Severity::Info, format!("Starting {label} with the {} tool", job.tool));

    let policy = RetryPolicy::from_config(&config.retry);
    let outcome = run_with_retry(&policy, &engine.stop, |number| {
        if number > 1 {
            engine.status.log(
                Severity::Warning,
                format!("Retrying {label} (attempt {number}/{})", policy.max_attempts),
            );
        }
        Attempt {
            engine,
            job,
            number,
            command: &command,
            manual_playlist,
        }
        .run()
    });

    match outcome {
        RetryOutcome::Succeeded { attempts } => {
            if let Some(playlist) = &playlist {
                let normalized = engine
                    .locks
                    .with_lock(playlist.path(), || playlist.normalize_paths());
                if let Err(e) = normalized {
                    tracing::warn!(playlist = %playlist.path().display(), "playlist normalize failed: {e}");
                }
            }
            engine.status.log(Severity::Info, format!("Finished {label}"));
            Some(JobResult::success(job, attempts))
        }
        RetryOutcome::Failed { attempts, error } => {
            engine
                .status
                .log(Severity::Error, format!("Failed {label} after {attempts} attempt(s): {error}"));
            Some(JobResult::failed(job, attempts, error.summary()))
        }
        RetryOutcome::Cancelled { attempts } => {
            tracing::info!(job = job.id, attempts, "job dropped by stop");
            None
        }
    }
}
