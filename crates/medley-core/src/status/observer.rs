//! Observer interface for status and log broadcasts.

use serde::Serialize;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};

use super::{LogMessage, StatusRecord};

/// Event delivered to observers after every board mutation or log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum EngineEvent {
    Status(StatusRecord),
    Log(LogMessage),
}

impl EngineEvent {
    /// Wire form: `{"type": "status"|"log", "payload": {...}}`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Receives engine events. Called from worker threads, never under the board lock.
pub trait StatusObserver: Send + Sync {
    fn on_event(&self, event: &EngineEvent);
}

impl<F> StatusObserver for F
where
    F: Fn(&EngineEvent) + Send + Sync,
{
    fn on_event(&self, event: &EngineEvent) {
        self(event)
    }
}

/// Forwards events into an mpsc channel; a dropped receiver is ignored.
pub struct ChannelObserver {
    tx: Mutex<Sender<EngineEvent>>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<EngineEvent>) -> Self {
        Self { tx: Mutex::new(tx) }
    }
}

impl StatusObserver for ChannelObserver {
    fn on_event(&self, event: &EngineEvent) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = tx.send(event.clone());
    }
}
