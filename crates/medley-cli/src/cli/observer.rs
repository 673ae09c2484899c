//! Terminal rendering of engine events.

use medley_core::status::Severity;
use medley_core::{EngineEvent, StatusObserver, StatusRecord};
use std::sync::{Mutex, PoisonError};

/// Prints log lines and a progress line whenever the item or count changes.
pub struct ConsoleObserver {
    json: bool,
    last_progress: Mutex<Option<String>>,
}

impl ConsoleObserver {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            last_progress: Mutex::new(None),
        }
    }
}

/// `[done/total] state: item`; total is `?` until known.
pub(crate) fn format_progress(status: &StatusRecord) -> String {
    let total = if status.total_items == 0 {
        "?".to_string()
    } else {
        status.total_items.to_string()
    };
    let state = serde_json::to_value(status.state)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    match &status.current_item {
        Some(item) => format!("[{}/{}] {}: {}", status.downloaded_count, total, state, item),
        None => format!("[{}/{}] {}", status.downloaded_count, total, state),
    }
}

impl StatusObserver for ConsoleObserver {
    fn on_event(&self, event: &EngineEvent) {
        if self.json {
            match event.to_json() {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("could not encode event: {e}"),
            }
            return;
        }
        match event {
            EngineEvent::Log(log) => match log.severity {
                Severity::Info => println!("{}", log.message),
                Severity::Warning => eprintln!("warning: {}", log.message),
                Severity::Error => eprintln!("error: {}", log.message),
            },
            EngineEvent::Status(status) => {
                let line = format_progress(status);
                let mut last = self
                    .last_progress
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if last.as_deref() != Some(line.as_str()) {
                    println!("{line}");
                    *last = Some(line);
                }
            }
        }
    }
}
