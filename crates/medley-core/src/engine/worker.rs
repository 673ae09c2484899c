//! Fixed-size worker pool over a shared job queue.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use super::job::{Job, JobResult};
use crate::control::StopController;

/// Runs `jobs` on up to `workers` threads. `run_job` returns `None` for a
/// dropped (cancelled) job. Workers stop taking jobs once stop is set; a
/// job that panics is recorded as failed and its worker keeps going.
pub(super) fn run_pool<F>(
    jobs: Vec<Job>,
    workers: usize,
    stop: &StopController,
    run_job: F,
) -> Vec<JobResult>
where
    F: Fn(&Job) -> Option<JobResult> + Sync,
{
    if jobs.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, jobs.len());
    let queue: Mutex<VecDeque<Job>> = Mutex::new(jobs.into());
    let (tx, rx) = mpsc::channel();

    thread::scope(|s| {
        for worker in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let run_job = &run_job;
            s.spawn(move || loop {
                if stop.is_stopped() {
                    break;
                }
                // An empty queue is the "no more work" signal.
                let next = queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some(job) = next else {
                    break;
                };
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_job(&job)));
                let result = match outcome {
                    Ok(result) => result,
                    Err(payload) => {
                        let msg = panic_message(payload.as_ref());
                        tracing::error!(worker, job = job.id, "job panicked: {msg}");
                        Some(JobResult::failed(&job, 1, format!("internal error: {msg}")))
                    }
                };
                if let Some(result) = result {
                    let _ = tx.send(result);
                }
            });
        }
    });
    drop(tx);

    let mut results: Vec<JobResult> = rx.into_iter().collect();
    results.sort_by_key(|r| r.job_id);
    results
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
