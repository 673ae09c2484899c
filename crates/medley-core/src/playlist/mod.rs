//! M3U8 playlist files.
//!
//! Entries are `#EXTINF:<seconds>,<title>` followed by a relative path
//! line. Paths are always written as `./<file name>` and are the identity
//! of an entry: appending a path that is already listed is a no-op, so
//! re-running a job never duplicates entries. The `#EXTM3U` header is
//! written exactly once.

mod layout;
mod lock;
mod probe;
mod resolve;

use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub use layout::PlaylistLayout;
pub use lock::PlaylistLocks;
pub use probe::{parse_duration, DurationProbe, FfprobeProbe};
pub use resolve::{
    base_name, has_media_extension, reported_file_name, resolve_media_file, MEDIA_EXTENSIONS,
};

pub const HEADER: &str = "#EXTM3U";
const EXTINF: &str = "#EXTINF:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtInf {
    pub duration: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub info: Option<ExtInf>,
    pub path: String,
}

/// `./<file name>` for any reported path or name.
pub fn relative_path(reported: &str) -> String {
    format!("./{}", base_name(reported))
}

fn parse_extinf(rest: &str) -> ExtInf {
    let (duration, title) = rest.split_once(',').unwrap_or((rest, ""));
    let duration = duration
        .split_whitespace()
        .next()
        .and_then(|d| d.parse().ok())
        .unwrap_or(0);
    ExtInf {
        duration,
        title: title.trim().to_string(),
    }
}

fn parse_entries(text: &str) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();
    let mut pending = None;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix(EXTINF) {
            pending = Some(parse_extinf(rest));
        } else if !line.starts_with('#') {
            entries.push(PlaylistEntry {
                info: pending.take(),
                path: line.to_string(),
            });
        }
    }
    entries
}

fn render(entries: &[PlaylistEntry]) -> String {
    let mut out = String::with_capacity(16 + entries.len() * 64);
    out.push_str(HEADER);
    out.push('\n');
    for e in entries {
        if let Some(info) = &e.info {
            out.push_str(&format!("{EXTINF}{},{}\n", info.duration, info.title));
        }
        out.push_str(&e.path);
        out.push('\n');
    }
    out
}

fn one_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ").trim().to_string()
}

/// A playlist file plus the directory its relative paths point into.
#[derive(Debug, Clone)]
pub struct PlaylistFile {
    path: PathBuf,
    media_dir: PathBuf,
}

impl PlaylistFile {
    pub fn new(path: impl Into<PathBuf>, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            media_dir: media_dir.into(),
        }
    }

    /// The named playlist of a layout; `None` for unnamed jobs. A legacy
    /// root-level file is reused while no current-layout file exists.
    pub fn for_layout(layout: &PlaylistLayout) -> Option<Self> {
        Some(Self::new(layout.active_playlist_file()?, layout.media_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed entries; a missing file has none.
    pub fn entries(&self) -> io::Result<Vec<PlaylistEntry>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse_entries(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Appends one entry unless its relative path is already listed.
    /// Returns whether anything was written.
    pub fn append(&self, title: &str, duration_secs: u64, file_name: &str) -> io::Result<bool> {
        let rel = relative_path(file_name);
        let existing = self.entries()?;
        if existing.iter().any(|e| relative_path(&e.path) == rel) {
            return Ok(false);
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut chunk = String::new();
        if file.metadata()?.len() == 0 {
            chunk.push_str(HEADER);
            chunk.push('\n');
        }
        chunk.push_str(&format!("{EXTINF}{duration_secs},{}\n{rel}\n", one_line(title)));
        file.write_all(chunk.as_bytes())?;
        Ok(true)
    }

    /// Appends the media file a tool reported as finished.
    ///
    /// The reported name is resolved inside the media directory and probed
    /// for its duration. An unresolvable name is still recorded, with zero
    /// duration, the reported title, and a path safe to use as a file name.
    pub fn record_completion(&self, reported: &str, probe: &dyn DurationProbe) -> io::Result<bool> {
        match resolve_media_file(&self.media_dir, reported) {
            Some(found) => {
                let file_name = found
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| base_name(reported).to_string());
                let title = found
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file_name.clone());
                let duration = probe.duration_secs(&found).unwrap_or(0);
                self.append(&title, duration, &file_name)
            }
            None => {
                let file_name = reported_file_name(reported);
                let title = if has_media_extension(&file_name) {
                    Path::new(&file_name)
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| file_name.clone())
                } else {
                    reported.trim().to_string()
                };
                tracing::debug!(reported, playlist = %self.path.display(), "media file not found on disk");
                self.append(&title, 0, &file_name)
            }
        }
    }

    /// Rewrites every path to `./<file name>`, drops duplicate paths, and
    /// leaves a single header. Returns whether the file changed.
    pub fn normalize_paths(&self) -> io::Result<bool> {
        self.rewrite(|_| {})
    }

    /// Points entries at renamed files (`old file name -> new file name`), then normalizes.
    pub fn rename_entries(&self, renames: &HashMap<String, String>) -> io::Result<bool> {
        self.rewrite(|entry| {
            if let Some(new_name) = renames.get(base_name(&entry.path)) {
                entry.path = relative_path(new_name);
            }
        })
    }

    fn rewrite(&self, mut edit: impl FnMut(&mut PlaylistEntry)) -> io::Result<bool> {
        let original = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        let mut seen = HashSet::new();
        let entries: Vec<PlaylistEntry> = parse_entries(&original)
            .into_iter()
            .filter_map(|mut entry| {
                edit(&mut entry);
                entry.path = relative_path(&entry.path);
                seen.insert(entry.path.clone()).then_some(entry)
            })
            .collect();
        let updated = render(&entries);
        if updated == original {
            return Ok(false);
        }
        write_replacing(&self.path, &updated)?;
        Ok(true)
    }
}

/// Writes via a sibling temp file and rename so readers never see a partial file.
fn write_replacing(path: &Path, contents: &str) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}
