//! On-disk layout of a playlist folder.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::naming::safe_filename;

/// Paths derived from the output root and an optional playlist name.
///
/// ```text
/// {root}/{name}/{name}.m3u8
/// {root}/{name}/.sync/{sha256(url)}.spotdl
/// {root}/{name}.m3u8            legacy location, used while no current file exists
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistLayout {
    root: PathBuf,
    /// Sanitized folder/file stem.
    name: Option<String>,
}

impl PlaylistLayout {
    pub fn new(root: impl Into<PathBuf>, playlist_name: Option<&str>) -> Self {
        let name = playlist_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(safe_filename);
        Self {
            root: root.into(),
            name,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Where media files land: the playlist folder, or the root without a name.
    pub fn media_dir(&self) -> PathBuf {
        match &self.name {
            Some(name) => self.root.join(name),
            None => self.root.clone(),
        }
    }

    pub fn playlist_file(&self) -> Option<PathBuf> {
        let name = self.name.as_ref()?;
        Some(self.root.join(name).join(format!("{name}.m3u8")))
    }

    pub fn legacy_playlist_file(&self) -> Option<PathBuf> {
        let name = self.name.as_ref()?;
        Some(self.root.join(format!("{name}.m3u8")))
    }

    /// The existing playlist file, preferring the current layout over the legacy one.
    pub fn locate_playlist_file(&self) -> Option<PathBuf> {
        self.playlist_file()
            .filter(|p| p.is_file())
            .or_else(|| self.legacy_playlist_file().filter(|p| p.is_file()))
    }

    /// The playlist file jobs read and append to: an existing file found by
    /// [`locate_playlist_file`](Self::locate_playlist_file), else the
    /// current-layout path.
    pub fn active_playlist_file(&self) -> Option<PathBuf> {
        self.locate_playlist_file().or_else(|| self.playlist_file())
    }

    pub fn sync_dir(&self) -> PathBuf {
        self.media_dir().join(".sync")
    }

    /// Save-state file for a playlist URL; stable across runs.
    pub fn save_state_file(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.trim().as_bytes());
        self.sync_dir().join(format!("{}.spotdl", hex::encode(digest)))
    }

    /// Creates the media and sync directories (no error if they exist).
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.media_dir())?;
        fs::create_dir_all(self.sync_dir())
    }
}
