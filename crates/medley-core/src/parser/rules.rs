//! Ordered classification table.
//!
//! New tool-output patterns are added as rows; `classify` walks the table
//! in priority order and returns the first row that both matches and
//! accepts the line.

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

use super::{first_integer, ParseEvents};
use crate::status::{EngineState, LogMessage};
use crate::tools::Tool;

/// Line classes in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Discovery,
    ItemStart,
    Skipped,
    Completed,
    RateLimited,
    Unavailable,
    Diagnostic,
    Progress,
}

type Build = fn(&Captures<'_>, &str) -> Option<ParseEvents>;

struct Rule {
    class: LineClass,
    /// `None` applies to both tools.
    tool: Option<Tool>,
    pattern: Regex,
    build: Build,
}

fn rule(class: LineClass, tool: Option<Tool>, pattern: &str, build: Build) -> Rule {
    Rule {
        class,
        tool,
        pattern: Regex::new(pattern).expect("parser rule pattern"),
        build,
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    use LineClass::*;
    vec![
        rule(Discovery, Some(Tool::Music), r"Found \d+ songs? in (.+)", music_found),
        rule(Discovery, Some(Tool::Video), r"Downloading item (\d+) of (\d+)", video_item_of),
        rule(
            Discovery,
            Some(Tool::Video),
            r"Playlist (.+?): Downloading (\d+) items",
            video_playlist_size,
        ),
        rule(ItemStart, Some(Tool::Music), r#"^Downloading\s+"?(.+?)"?$"#, music_start),
        rule(ItemStart, Some(Tool::Video), r"^\[download\] Destination: (.+)$", video_start),
        rule(
            Skipped,
            Some(Tool::Music),
            r#"^Skipping\s+"?(.+?)"?(?:\s+\((?:file already exists|duplicate)[^)]*\))*$"#,
            music_skipped,
        ),
        rule(
            Skipped,
            Some(Tool::Video),
            r"^\[download\] (.+) has already been downloaded",
            video_skipped,
        ),
        rule(Completed, Some(Tool::Music), r#"Downloaded "(.+?)""#, music_completed),
        rule(
            Completed,
            Some(Tool::Video),
            r#"^\[(?:ExtractAudio|Merger|VideoConvertor)\] (?:Destination: |Merging formats into )"?(.+?)"?$"#,
            video_completed,
        ),
        rule(
            RateLimited,
            None,
            r"rate/request limit|Too Many Requests|HTTP Error 429",
            rate_limited,
        ),
        rule(
            Unavailable,
            Some(Tool::Music),
            r"No results found for (?:song:\s*)?(.+)",
            music_not_found,
        ),
        rule(Unavailable, Some(Tool::Music), r"LookupError:?\s*(.*)", music_not_found),
        rule(
            Unavailable,
            Some(Tool::Video),
            r"ERROR: (.*(?:Video unavailable|Private video|video is not available|has been removed).*)",
            video_unavailable,
        ),
        rule(Diagnostic, None, r"WARNING:\s*(.*)", warning),
        rule(Diagnostic, None, r"ERROR:\s*(.*)|PermissionError|Traceback", error),
        rule(Progress, None, r"^\[download\]\s+\d+(?:\.\d+)?%", progress),
    ]
});

/// First matching rule's class and events, or `None` for inert lines.
pub(super) fn classify(line: &str, tool: Tool) -> Option<(LineClass, ParseEvents)> {
    RULES
        .iter()
        .filter(|r| r.tool.map_or(true, |t| t == tool))
        .find_map(|r| {
            let caps = r.pattern.captures(line)?;
            (r.build)(&caps, line).map(|events| (r.class, events))
        })
}

fn cap<'a>(caps: &'a Captures<'_>, i: usize) -> &'a str {
    caps.get(i).map_or("", |m| m.as_str()).trim()
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn music_found(caps: &Captures<'_>, line: &str) -> Option<ParseEvents> {
    let total = first_integer(line)?;
    let name = cap(caps, 1).replace("(Playlist)", "");
    let name = name.trim();
    Some(ParseEvents {
        total_items: Some(total),
        log: Some(LogMessage::info(format!("Found {total} songs in {name}"))),
        ..ParseEvents::default()
    })
}

fn video_item_of(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    let total = cap(caps, 2).parse().ok()?;
    Some(ParseEvents {
        total_items: Some(total),
        log: Some(LogMessage::info(format!(
            "Processing item {} of {total}",
            cap(caps, 1)
        ))),
        ..ParseEvents::default()
    })
}

fn video_playlist_size(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    let total = cap(caps, 2).parse().ok()?;
    Some(ParseEvents {
        total_items: Some(total),
        log: Some(LogMessage::info(format!(
            "Playlist {}: {total} items",
            cap(caps, 1)
        ))),
        ..ParseEvents::default()
    })
}

fn music_start(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    let item = cap(caps, 1);
    // "Downloading https://..." is a fetch notice, not an item.
    if item.is_empty() || item.contains("http") {
        return None;
    }
    Some(ParseEvents {
        new_state: Some(EngineState::Downloading),
        current_item: Some(item.to_string()),
        log: Some(LogMessage::info(format!("Downloading {item}"))),
        ..ParseEvents::default()
    })
}

fn video_start(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    Some(ParseEvents {
        new_state: Some(EngineState::Downloading),
        current_item: Some(file_stem(cap(caps, 1))),
        ..ParseEvents::default()
    })
}

fn music_skipped(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    let item = cap(caps, 1);
    if item.is_empty() || item.contains("http") {
        return None;
    }
    Some(ParseEvents {
        current_item: Some(item.to_string()),
        downloaded_increment: 1,
        log: Some(LogMessage::info(format!("Already present: {item}"))),
        new_filename: Some(item.to_string()),
        ..ParseEvents::default()
    })
}

fn video_skipped(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    let path = cap(caps, 1);
    let stem = file_stem(path);
    Some(ParseEvents {
        current_item: Some(stem.clone()),
        downloaded_increment: 1,
        log: Some(LogMessage::info(format!("Already present: {stem}"))),
        new_filename: Some(file_name(path)),
        ..ParseEvents::default()
    })
}

fn music_completed(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    let item = cap(caps, 1);
    Some(ParseEvents {
        current_item: Some(item.to_string()),
        downloaded_increment: 1,
        log: Some(LogMessage::info(format!("Downloaded {item}"))),
        new_filename: Some(item.to_string()),
        ..ParseEvents::default()
    })
}

fn video_completed(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    let path = cap(caps, 1);
    let stem = file_stem(path);
    Some(ParseEvents {
        current_item: Some(stem.clone()),
        downloaded_increment: 1,
        log: Some(LogMessage::info(format!("Downloaded {stem}"))),
        new_filename: Some(file_name(path)),
        ..ParseEvents::default()
    })
}

fn rate_limited(_caps: &Captures<'_>, line: &str) -> Option<ParseEvents> {
    // The wait is the number after the "after" marker; the status code (429)
    // may appear earlier in the line.
    let wait = line
        .find("after")
        .and_then(|i| first_integer(&line[i..]));
    let message = match wait {
        Some(secs) => format!("Rate limited upstream, waiting {secs}s"),
        None => "Rate limited upstream, waiting".to_string(),
    };
    Some(ParseEvents {
        new_state: Some(EngineState::Retrying),
        log: Some(LogMessage::warning(message)),
        ..ParseEvents::default()
    })
}

fn music_not_found(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    let what = cap(caps, 1);
    let message = if what.is_empty() {
        "No match found".to_string()
    } else {
        format!("No match found: {what}")
    };
    Some(ParseEvents {
        downloaded_increment: 1,
        log: Some(LogMessage::error(message)),
        ..ParseEvents::default()
    })
}

fn video_unavailable(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    Some(ParseEvents {
        downloaded_increment: 1,
        log: Some(LogMessage::error(format!("Unavailable: {}", cap(caps, 1)))),
        ..ParseEvents::default()
    })
}

fn warning(caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    let message = cap(caps, 1);
    if message.is_empty() {
        return None;
    }
    Some(ParseEvents {
        log: Some(LogMessage::warning(message)),
        ..ParseEvents::default()
    })
}

fn error(caps: &Captures<'_>, line: &str) -> Option<ParseEvents> {
    let message = if line.contains("PermissionError") {
        format!("Permission denied writing output: {line}")
    } else {
        match cap(caps, 1) {
            "" => line.to_string(),
            m => m.to_string(),
        }
    };
    Some(ParseEvents {
        log: Some(LogMessage::error(message)),
        ..ParseEvents::default()
    })
}

fn progress(_caps: &Captures<'_>, _line: &str) -> Option<ParseEvents> {
    Some(ParseEvents {
        new_state: Some(EngineState::Downloading),
        ..ParseEvents::default()
    })
}
