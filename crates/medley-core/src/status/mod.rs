//! Live status board shared by the engine and its observers.
//!
//! One `StatusBoard` per engine holds the current `StatusRecord` behind a
//! mutex. Every mutation is applied under the lock and its snapshot is
//! queued in the same critical section, so the queue holds events in
//! mutation order. Observers are called after the lock is released, by one
//! delivering thread at a time draining that queue: observers see
//! snapshots in the order they were taken, and may call back into the
//! board without deadlocking.

mod observer;

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::parser::ParseEvents;

pub use observer::{ChannelObserver, EngineEvent, StatusObserver};

/// Coarse engine state shown to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Idle,
    Starting,
    Downloading,
    /// Upstream throttling; cleared by the next classified output line.
    Retrying,
    Stopping,
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub state: EngineState,
    pub current_item: Option<String>,
    pub total_items: u64,
    /// Items processed in this batch (completed, skipped, or unresolvable).
    pub downloaded_count: u64,
    pub playlist_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Human-readable log line for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub message: String,
    pub severity: Severity,
}

impl LogMessage {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

#[derive(Debug, Default)]
struct BoardState {
    record: StatusRecord,
    /// Total accumulated by jobs finished before the current one.
    job_base_total: u64,
    /// Set when the batch total is known up front (title batches).
    total_locked: bool,
}

/// Events waiting for delivery, oldest first.
#[derive(Default)]
struct Outbox {
    queue: VecDeque<EngineEvent>,
    /// A thread is currently delivering from `queue`.
    draining: bool,
}

/// Clears `draining` if an observer panics mid-delivery.
struct DrainGuard<'a> {
    outbox: &'a Mutex<Outbox>,
    armed: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock_outbox(self.outbox).draining = false;
        }
    }
}

fn lock_outbox(outbox: &Mutex<Outbox>) -> MutexGuard<'_, Outbox> {
    outbox.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, observable status record.
#[derive(Default)]
pub struct StatusBoard {
    inner: Mutex<BoardState>,
    /// Locked after `inner` when both are held.
    outbox: Mutex<Outbox>,
    observers: RwLock<Vec<Arc<dyn StatusObserver>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn StatusObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn snapshot(&self) -> StatusRecord {
        self.lock().record.clone()
    }

    pub fn state(&self) -> EngineState {
        self.lock().record.state
    }

    /// Starts a batch: counts return to zero, state becomes `Starting`.
    pub fn begin_batch(&self, playlist_name: Option<&str>) {
        self.update(|s| {
            *s = BoardState::default();
            s.record.state = EngineState::Starting;
            s.record.playlist_name = playlist_name.map(str::to_string);
        });
    }

    /// Pins the batch total; later discovery lines no longer change it.
    pub fn fix_total(&self, total: u64) {
        self.update(|s| {
            s.record.total_items = total;
            s.total_locked = true;
        });
    }

    /// Marks the start of a job. Discovery totals reported by this job add
    /// to what earlier jobs of the batch reported.
    pub fn begin_job(&self, label: &str) {
        self.update(|s| {
            s.job_base_total = s.record.total_items;
            if s.record.state != EngineState::Stopping {
                s.record.state = EngineState::Downloading;
            }
            s.record.current_item = Some(label.to_string());
        });
    }

    pub fn set_state(&self, state: EngineState) {
        self.update(|s| s.record.state = state);
    }

    /// Applies parser output. Broadcasts the log message (if any) and then
    /// the updated record (if it changed).
    pub fn apply(&self, events: &ParseEvents) {
        if events.is_empty() {
            return;
        }
        if let Some(log) = &events.log {
            trace_log(log);
        }
        {
            let mut s = self.lock();
            let before = s.record.clone();
            // A stop in progress owns the state until the batch resets.
            if let Some(state) = events.new_state {
                if s.record.state != EngineState::Stopping {
                    s.record.state = state;
                }
            }
            if let Some(item) = &events.current_item {
                s.record.current_item = Some(item.clone());
            }
            if let Some(total) = events.total_items {
                if !s.total_locked {
                    s.record.total_items = s.job_base_total.saturating_add(total);
                }
            }
            s.record.downloaded_count = s
                .record
                .downloaded_count
                .saturating_add(u64::from(events.downloaded_increment));
            let mut out = lock_outbox(&self.outbox);
            if let Some(log) = &events.log {
                out.queue.push_back(EngineEvent::Log(log.clone()));
            }
            if s.record != before {
                out.queue.push_back(EngineEvent::Status(s.record.clone()));
            }
        }
        self.flush();
    }

    /// Emits a log message to observers and to the tracing log.
    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        let log = LogMessage::new(severity, message);
        trace_log(&log);
        lock_outbox(&self.outbox)
            .queue
            .push_back(EngineEvent::Log(log));
        self.flush();
    }

    /// Back to idle after a batch; counts stay readable until the next batch.
    pub fn reset_idle(&self) {
        self.update(|s| {
            s.record.state = EngineState::Idle;
            s.record.current_item = None;
        });
    }

    fn update(&self, f: impl FnOnce(&mut BoardState)) {
        {
            let mut s = self.lock();
            f(&mut s);
            let record = s.record.clone();
            lock_outbox(&self.outbox)
                .queue
                .push_back(EngineEvent::Status(record));
        }
        self.flush();
    }

    /// Delivers queued events unless another thread already is; that thread
    /// then delivers ours too, in queue order.
    fn flush(&self) {
        {
            let mut out = lock_outbox(&self.outbox);
            if out.draining {
                return;
            }
            out.draining = true;
        }
        let mut guard = DrainGuard {
            outbox: &self.outbox,
            armed: true,
        };
        loop {
            let next = {
                let mut out = lock_outbox(&self.outbox);
                match out.queue.pop_front() {
                    Some(event) => event,
                    None => {
                        out.draining = false;
                        guard.armed = false;
                        return;
                    }
                }
            };
            self.broadcast(&next);
        }
    }

    fn broadcast(&self, event: &EngineEvent) {
        let observers: Vec<_> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_event(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn trace_log(log: &LogMessage) {
    match log.severity {
        Severity::Info => tracing::info!("{}", log.message),
        Severity::Warning => tracing::warn!("{}", log.message),
        Severity::Error => tracing::error!("{}", log.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn board_with_channel() -> (StatusBoard, mpsc::Receiver<EngineEvent>) {
        let board = StatusBoard::new();
        let (tx, rx) = mpsc::channel();
        board.subscribe(Arc::new(ChannelObserver::new(tx)));
        (board, rx)
    }

    fn increment() -> ParseEvents {
        ParseEvents {
            downloaded_increment: 1,
            ..ParseEvents::default()
        }
    }

    #[test]
    fn begin_batch_resets_counts() {
        let board = StatusBoard::new();
        board.apply(&increment());
        board.apply(&increment());
        assert_eq!(board.snapshot().downloaded_count, 2);

        board.begin_batch(Some("Mix"));
        let rec = board.snapshot();
        assert_eq!(rec.downloaded_count, 0);
        assert_eq!(rec.state, EngineState::Starting);
        assert_eq!(rec.playlist_name.as_deref(), Some("Mix"));
    }

    #[test]
    fn every_mutation_is_broadcast() {
        let (board, rx) = board_with_channel();
        board.begin_batch(None);
        board.set_state(EngineState::Downloading);
        board.apply(&ParseEvents {
            current_item: Some("Song".into()),
            log: Some(LogMessage::info("Downloading Song")),
            ..ParseEvents::default()
        });
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[2], EngineEvent::Log(l) if l.message == "Downloading Song"));
        assert!(
            matches!(&events[3], EngineEvent::Status(r) if r.current_item.as_deref() == Some("Song"))
        );
    }

    #[test]
    fn empty_events_are_not_broadcast() {
        let (board, rx) = board_with_channel();
        board.apply(&ParseEvents::default());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn discovery_totals_accumulate_per_job() {
        let board = StatusBoard::new();
        board.begin_batch(None);
        board.begin_job("a");
        board.apply(&ParseEvents {
            total_items: Some(5),
            ..ParseEvents::default()
        });
        // Repeated discovery within a job replaces rather than adds.
        board.apply(&ParseEvents {
            total_items: Some(6),
            ..ParseEvents::default()
        });
        board.begin_job("b");
        board.apply(&ParseEvents {
            total_items: Some(4),
            ..ParseEvents::default()
        });
        assert_eq!(board.snapshot().total_items, 10);
    }

    #[test]
    fn fixed_total_ignores_discovery() {
        let board = StatusBoard::new();
        board.begin_batch(None);
        board.fix_total(120);
        board.begin_job("batch 1");
        board.apply(&ParseEvents {
            total_items: Some(50),
            ..ParseEvents::default()
        });
        assert_eq!(board.snapshot().total_items, 120);
    }

    #[test]
    fn stopping_is_not_overwritten_by_parser() {
        let board = StatusBoard::new();
        board.set_state(EngineState::Stopping);
        board.apply(&ParseEvents {
            new_state: Some(EngineState::Downloading),
            downloaded_increment: 1,
            ..ParseEvents::default()
        });
        let rec = board.snapshot();
        assert_eq!(rec.state, EngineState::Stopping);
        assert_eq!(rec.downloaded_count, 1);
    }

    #[test]
    fn reset_idle_clears_current_item_only() {
        let board = StatusBoard::new();
        board.begin_batch(Some("Mix"));
        board.begin_job("x");
        board.apply(&increment());
        board.reset_idle();
        let rec = board.snapshot();
        assert_eq!(rec.state, EngineState::Idle);
        assert!(rec.current_item.is_none());
        assert_eq!(rec.downloaded_count, 1);
    }

    #[test]
    fn concurrent_increments_are_observed_in_order() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 250;
        let (board, rx) = board_with_channel();
        board.begin_batch(None);

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for _ in 0..PER_THREAD {
                        board.apply(&increment());
                    }
                });
            }
        });

        let counts: Vec<u64> = rx
            .try_iter()
            .filter_map(|e| match e {
                EngineEvent::Status(r) => Some(r.downloaded_count),
                EngineEvent::Log(_) => None,
            })
            .collect();
        assert!(counts.windows(2).all(|w| w[0] < w[1]), "{counts:?}");
        assert_eq!(counts.last(), Some(&(THREADS * PER_THREAD)));
    }

    #[test]
    fn observer_may_log_from_callback() {
        let board = Arc::new(StatusBoard::new());
        let (tx, rx) = mpsc::channel();
        board.subscribe(Arc::new(ChannelObserver::new(tx)));
        let weak = Arc::downgrade(&board);
        board.subscribe(Arc::new(move |event: &EngineEvent| {
            if let (EngineEvent::Status(r), Some(board)) = (event, weak.upgrade()) {
                if r.state == EngineState::Stopping {
                    board.log(Severity::Warning, "stopping");
                }
            }
        }));

        board.set_state(EngineState::Stopping);
        board.set_state(EngineState::Idle);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], EngineEvent::Status(r) if r.state == EngineState::Stopping));
        assert!(matches!(&events[1], EngineEvent::Log(l) if l.message == "stopping"));
        assert!(matches!(&events[2], EngineEvent::Status(r) if r.state == EngineState::Idle));
    }

    #[test]
    fn status_event_json_shape() {
        let event = EngineEvent::Status(StatusRecord {
            state: EngineState::Retrying,
            ..StatusRecord::default()
        });
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""type":"status""#));
        assert!(json.contains(r#""state":"retrying""#));

        let log = EngineEvent::Log(LogMessage::warning("slow down"));
        let json = log.to_json().unwrap();
        assert!(json.contains(r#""type":"log""#));
        assert!(json.contains(r#""severity":"warning""#));
    }
}
