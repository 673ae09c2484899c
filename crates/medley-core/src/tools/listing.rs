//! Video playlist listing into music search batches.

use regex::Regex;
use std::sync::LazyLock;

use crate::naming::{clean_search_title, is_unavailable_title};

/// Status prefixes the listing tool prints around titles: extractor keys
/// such as `[youtube:tab]` and its own stages such as `[info]`.
static TOOL_CHATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\[(?:info|debug|download|generic|youtube|soundcloud|bandcamp|vimeo|dailymotion)(?::[a-z_]+)*\]|WARNING:|ERROR:)",
    )
    .expect("chatter pattern")
});

fn is_tool_chatter(line: &str) -> bool {
    TOOL_CHATTER.is_match(line)
}

/// Turns raw listing output (one title per line) into cleaned search queries.
///
/// Blank lines, tool chatter (`[info]`, `[youtube:tab]`, `WARNING:`) and
/// unavailable-entry placeholders are dropped. Other bracketed titles such
/// as `[Ruby] Artist - Song` are kept.
pub fn titles_from_listing<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let line = line.as_ref().trim();
            if line.is_empty() || is_unavailable_title(line) || is_tool_chatter(line) {
                return None;
            }
            let cleaned = clean_search_title(line);
            (!cleaned.is_empty()).then_some(cleaned)
        })
        .collect()
}

/// Splits titles into consecutive batches of at most `batch_size` (at least 1).
pub fn into_batches(titles: Vec<String>, batch_size: usize) -> Vec<Vec<String>> {
    let size = batch_size.max(1);
    let mut batches = Vec::with_capacity(titles.len().div_ceil(size));
    let mut iter = titles.into_iter().peekable();
    while iter.peek().is_some() {
        batches.push(iter.by_ref().take(size).collect());
    }
    batches
}
