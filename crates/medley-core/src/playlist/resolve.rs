//! Reported name to on-disk media file.

use std::path::{Path, PathBuf};

use crate::naming::safe_filename;

/// Extensions probed when a tool reports a bare stem.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "opus", "ogg", "flac", "wav", "aac", "webm", "mp4", "mkv",
];

/// Last path component, tolerant of both separator styles.
pub fn base_name(reported: &str) -> &str {
    let trimmed = reported.trim().trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

pub fn has_media_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MEDIA_EXTENSIONS.iter().any(|m| m.eq_ignore_ascii_case(e)))
}

/// True when a report names a media file (possibly by path) rather than a
/// song title. Only file reports have directories to strip: a title such
/// as `AC/DC - Thunderstruck` keeps its slash.
fn names_media_file(reported: &str) -> bool {
    has_media_extension(base_name(reported))
}

/// File name to record for a report that did not resolve on disk.
pub fn reported_file_name(reported: &str) -> String {
    let reported = reported.trim();
    if names_media_file(reported) {
        base_name(reported).to_string()
    } else if reported.contains(['/', '\\']) {
        safe_filename(reported)
    } else {
        reported.to_string()
    }
}

/// Finds the file a tool reported inside `media_dir`.
///
/// Accepts a full name, a path, or a song title without extension. Titles
/// are tried whole, as reported and in sanitized form, with each known
/// extension.
pub fn resolve_media_file(media_dir: &Path, reported: &str) -> Option<PathBuf> {
    let reported = reported.trim();
    let stem = if names_media_file(reported) {
        let name = base_name(reported);
        let direct = media_dir.join(name);
        if direct.is_file() {
            return Some(direct);
        }
        name
    } else {
        reported
    };
    if stem.is_empty() {
        return None;
    }
    let sanitized = safe_filename(stem);
    let mut stems = Vec::with_capacity(2);
    if !stem.contains(['/', '\\']) {
        stems.push(stem);
    }
    if sanitized != stem {
        stems.push(sanitized.as_str());
    }
    stems.iter().find_map(|stem| {
        MEDIA_EXTENSIONS
            .iter()
            .map(|ext| media_dir.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
    })
}
