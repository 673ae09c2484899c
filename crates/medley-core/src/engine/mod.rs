//! Job orchestration engine.
//!
//! `Engine::process_batch` turns caller inputs into jobs (expanding
//! video-platform playlists into music search batches), runs them on a
//! worker pool with per-job retry, and returns one `JobResult` per job
//! that reached a terminal outcome. `Engine::stop` may be called from any
//! thread while a batch runs.

mod attempt;
mod job;
mod maintenance;
mod plan;
mod worker;

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::control::{default_reaper, ProcessReaper, StopController};
use crate::parser::LogEventParser;
use crate::playlist::{DurationProbe, FfprobeProbe, PlaylistLocks};
use crate::status::{EngineState, StatusBoard, StatusObserver, StatusRecord};
use crate::tools::verify_dependencies;

pub use job::{BatchInput, BatchReport, Job, JobResult, JobStatus, Target};
pub use maintenance::SanitizeReport;

pub struct Engine {
    config: EngineConfig,
    status: StatusBoard,
    stop: StopController,
    parser: LogEventParser,
    probe: Box<dyn DurationProbe>,
    locks: PlaylistLocks,
    /// Serializes batches; one batch runs at a time.
    batch_lock: Mutex<()>,
    running: AtomicBool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let stop = StopController::new(default_reaper(), config.orphan_patterns.clone());
        let parser = LogEventParser::new(config.noise.clone());
        let probe = Box::new(FfprobeProbe::new(config.tools.probe.clone()));
        Self {
            config,
            status: StatusBoard::new(),
            stop,
            parser,
            probe,
            locks: PlaylistLocks::new(),
            batch_lock: Mutex::new(()),
            running: AtomicBool::new(false),
        }
    }

    /// Replaces the orphan reaper (e.g. `NoopReaper` where sweeping is unwanted).
    pub fn with_reaper(mut self, reaper: Box<dyn ProcessReaper>) -> Self {
        let grace = self.stop.grace();
        self.stop = StopController::new(reaper, self.config.orphan_patterns.clone()).with_grace(grace);
        self
    }

    pub fn with_probe(mut self, probe: Box<dyn DurationProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// TERM-to-KILL grace period for stopped subprocesses.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop = self.stop.with_grace(grace);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn subscribe(&self, observer: Arc<dyn StatusObserver>) {
        self.status.subscribe(observer);
    }

    pub fn current_status(&self) -> StatusRecord {
        self.status.snapshot()
    }

    /// Names of configured tool binaries that cannot be found.
    pub fn verify_dependencies(&self) -> Vec<String> {
        verify_dependencies(&self.config.tools)
    }

    /// Requests cancellation of the running batch. Running subprocesses are
    /// terminated; queued and in-flight jobs produce no Result.
    pub fn stop(&self) {
        tracing::info!("stop requested");
        let running = self.running.load(Ordering::SeqCst);
        if running {
            self.status.set_state(EngineState::Stopping);
        }
        self.stop.stop();
        if !running {
            self.status.reset_idle();
        }
    }

    /// Runs a batch to completion (blocking) and returns its Results in job order.
    pub fn process_batch(&self, inputs: Vec<BatchInput>, playlist_name: Option<&str>) -> Vec<JobResult> {
        let _batch = self.batch_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Clear before raising `running` so a stop that sees the batch as
        // running always leaves its flag set.
        self.stop.clear();
        self.running.store(true, Ordering::SeqCst);
        self.status.begin_batch(playlist_name);
        let started = Instant::now();

        let plan = plan::plan_batch(self, inputs, playlist_name);
        if let Some(total) = plan.fixed_total {
            self.status.fix_total(total);
        }
        let planned = plan.jobs.len() + plan.failures.len();
        tracing::info!(jobs = plan.jobs.len(), "batch planned");

        let mut results = plan.failures;
        results.extend(worker::run_pool(
            plan.jobs,
            self.config.effective_concurrency(),
            &self.stop,
            |job| attempt::run_job(self, job),
        ));
        results.sort_by_key(|r| r.job_id);

        let report = BatchReport::from_results(planned, &results);
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            dropped = report.dropped,
            elapsed_secs = started.elapsed().as_secs(),
            "batch finished"
        );
        self.status.reset_idle();
        self.running.store(false, Ordering::SeqCst);
        results
    }

    /// Renames existing media files to sanitized names and updates the
    /// playlists referencing them. Safe to run repeatedly.
    pub fn sanitize_existing_files(&self) -> Result<SanitizeReport> {
        maintenance::sanitize_tree(&self.config.output_dir, &self.locks)
    }
}
