//! Streaming classifier for tool output.
//!
//! `LogEventParser::parse` maps one raw output line to a sparse
//! `ParseEvents` record. Classification is an ordered rule table (see
//! `rules`): the first rule whose tool filter and pattern match wins.
//! Unrecognized lines are inert; parsing never fails.

mod rules;

use regex::Regex;
use std::sync::LazyLock;

use crate::status::{EngineState, LogMessage};
use crate::tools::Tool;

pub use rules::LineClass;

static ANSI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("ansi pattern"));

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("integer pattern"));

/// Structured result of parsing one line. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseEvents {
    pub new_state: Option<EngineState>,
    pub current_item: Option<String>,
    /// Items terminally processed by this line (0 or 1 for line-level rules).
    pub downloaded_increment: u32,
    pub total_items: Option<u64>,
    pub log: Option<LogMessage>,
    /// Title or file name of a finished item, for playlist writing.
    pub new_filename: Option<String>,
}

impl ParseEvents {
    pub fn is_empty(&self) -> bool {
        self.new_state.is_none()
            && self.current_item.is_none()
            && self.downloaded_increment == 0
            && self.total_items.is_none()
            && self.log.is_none()
            && self.new_filename.is_none()
    }
}

/// First run of ASCII digits in `s`, if it parses.
pub(crate) fn first_integer(s: &str) -> Option<u64> {
    INTEGER.find(s).and_then(|m| m.as_str().parse().ok())
}

/// Removes terminal color sequences.
pub fn strip_ansi(line: &str) -> std::borrow::Cow<'_, str> {
    ANSI.replace_all(line, "")
}

/// Tool output classifier. Holds only the noise list; `parse` is pure.
#[derive(Debug, Clone, Default)]
pub struct LogEventParser {
    noise: Vec<String>,
}

impl LogEventParser {
    pub fn new(noise: Vec<String>) -> Self {
        Self {
            noise: noise.into_iter().filter(|n| !n.is_empty()).collect(),
        }
    }

    /// True when `line` contains a configured noise phrase.
    pub fn is_noise(&self, line: &str) -> bool {
        self.noise.iter().any(|n| line.contains(n.as_str()))
    }

    /// Classifies one output line.
    ///
    /// While `current_state` is `Retrying`, any classified line other than
    /// another rate-limit notice moves the state back to `Downloading`.
    pub fn parse(&self, line: &str, tool: Tool, current_state: EngineState) -> ParseEvents {
        let clean = strip_ansi(line);
        let line = clean.trim();
        if line.is_empty() {
            return ParseEvents::default();
        }

        let Some((class, mut events)) = rules::classify(line, tool) else {
            return ParseEvents::default();
        };
        if class == LineClass::Diagnostic && self.is_noise(line) {
            return ParseEvents::default();
        }
        if current_state == EngineState::Retrying
            && class != LineClass::RateLimited
            && events.new_state.is_none()
        {
            events.new_state = Some(EngineState::Downloading);
        }
        events
    }
}

#[cfg(test)]
mod tests;
