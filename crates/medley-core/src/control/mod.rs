//! Cooperative cancellation and subprocess registry.
//!
//! `StopController` pairs a level-triggered stop flag with the set of live
//! subprocess groups. Supervisors register each child for exactly the
//! lifetime of its run (`Registration` drops it again); `stop()` can be
//! called from any thread and force-terminates whatever is registered,
//! then asks the `ProcessReaper` to sweep orphans that escaped the groups.

mod reaper;
mod signal;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

pub use reaper::{default_reaper, NoopReaper, ProcessReaper, ProcfsReaper};
pub(crate) use signal::{group_alive, kill_group, terminate_group};

/// Time between TERM and KILL for a process group.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);

/// Granularity of interruptible sleeps and stop polling.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct StopController {
    stopped: AtomicBool,
    /// Process-group ids of running children.
    live: Mutex<HashSet<u32>>,
    reaper: Box<dyn ProcessReaper>,
    patterns: Vec<String>,
    grace: Duration,
}

impl StopController {
    /// `patterns` are the command-line substrings the reaper sweeps for.
    pub fn new(reaper: Box<dyn ProcessReaper>, patterns: Vec<String>) -> Self {
        Self {
            stopped: AtomicBool::new(false),
            live: Mutex::new(HashSet::new()),
            reaper,
            patterns,
            grace: DEFAULT_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Re-arms the controller for a new batch.
    pub fn clear(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }

    /// Tracks a running process group until the returned guard is dropped.
    pub fn register(&self, pgid: u32) -> Registration<'_> {
        self.live().insert(pgid);
        Registration { owner: self, pgid }
    }

    pub fn live_count(&self) -> usize {
        self.live().len()
    }

    /// Sets the stop flag and tears down every registered process group:
    /// TERM now, KILL for groups still alive after the grace period, then
    /// an orphan sweep.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);

        let groups: Vec<u32> = {
            let live = self.live();
            for &pgid in live.iter() {
                terminate_group(pgid);
            }
            live.iter().copied().collect()
        };
        if !groups.is_empty() {
            tracing::info!(groups = groups.len(), "stop requested, terminating subprocesses");
        }

        let deadline = Instant::now() + self.grace;
        while Instant::now() < deadline {
            let any_alive = {
                let live = self.live();
                groups
                    .iter()
                    .any(|g| live.contains(g) && group_alive(*g))
            };
            if !any_alive {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }

        {
            let live = self.live();
            for &pgid in groups.iter().filter(|g| live.contains(g)) {
                if group_alive(pgid) {
                    tracing::warn!(pgid, "process group ignored SIGTERM, killing");
                    kill_group(pgid);
                }
            }
        }

        let swept = self.reaper.sweep(&self.patterns);
        if swept > 0 {
            tracing::warn!(swept, "killed orphaned tool processes");
        }
    }

    /// Sleeps for `total` in short slices; returns false as soon as a stop is observed.
    pub fn sleep_unless_stopped(&self, total: Duration) -> bool {
        let deadline = Instant::now() + total;
        loop {
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn live(&self) -> MutexGuard<'_, HashSet<u32>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes its process group from the registry when dropped.
pub struct Registration<'a> {
    owner: &'a StopController,
    pgid: u32,
}

impl Registration<'_> {
    pub fn pgid(&self) -> u32 {
        self.pgid
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.owner.live().remove(&self.pgid);
    }
}
