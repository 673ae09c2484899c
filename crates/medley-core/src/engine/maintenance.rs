//! Filename maintenance over an existing output tree.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::naming::safe_filename;
use crate::playlist::{has_media_extension, PlaylistFile, PlaylistLocks};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    pub renamed: usize,
    pub playlists_updated: usize,
}

fn is_playlist(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("m3u8") || e.eq_ignore_ascii_case("m3u"))
}

/// The root plus its visible immediate subdirectories (playlist folders).
fn media_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = vec![root.to_path_buf()];
    for entry in fs::read_dir(root).with_context(|| format!("read dir: {}", root.display()))? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Renames media files in `dir` to sanitized stems. Returns `old -> new` file names.
fn sanitize_dir(dir: &Path) -> Result<HashMap<String, String>> {
    let mut renames = HashMap::new();
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read dir: {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };
        if !has_media_extension(name) {
            continue;
        }
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        let new_name = format!("{}.{ext}", safe_filename(stem));
        if new_name == name {
            continue;
        }
        let target = dir.join(&new_name);
        if target.exists() {
            tracing::warn!(from = %path.display(), to = %target.display(), "rename target exists, skipping");
            continue;
        }
        fs::rename(&path, &target)
            .with_context(|| format!("rename {} -> {}", path.display(), target.display()))?;
        tracing::info!(from = name, to = %new_name, "renamed media file");
        renames.insert(name.to_string(), new_name);
    }
    Ok(renames)
}

fn playlists_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut playlists: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read dir: {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_playlist(p))
        .collect();
    playlists.sort();
    Ok(playlists)
}

/// Renames that apply to the entries of `playlist`, found in `dir`.
///
/// A root-level `{name}.m3u8` is the legacy home of the `{root}/{name}/`
/// playlist, so it follows that folder's renames on top of the root's.
fn renames_for(
    root: &Path,
    dir: &Path,
    playlist: &Path,
    by_dir: &HashMap<PathBuf, HashMap<String, String>>,
) -> HashMap<String, String> {
    let mut renames = by_dir.get(dir).cloned().unwrap_or_default();
    if dir == root {
        let folder = playlist.file_stem().map(|stem| root.join(stem));
        if let Some(folder_renames) = folder.and_then(|f| by_dir.get(&f)) {
            renames.extend(folder_renames.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    renames
}

/// Sanitizes media file names under `root` (one folder level deep) and
/// rewrites the playlists in each folder to match, including legacy
/// root-level playlists of named folders.
pub(super) fn sanitize_tree(root: &Path, locks: &PlaylistLocks) -> Result<SanitizeReport> {
    let mut report = SanitizeReport::default();
    if !root.is_dir() {
        return Ok(report);
    }
    let dirs = media_dirs(root)?;
    let mut by_dir = HashMap::with_capacity(dirs.len());
    for dir in &dirs {
        let renames = sanitize_dir(dir)?;
        report.renamed += renames.len();
        by_dir.insert(dir.clone(), renames);
    }

    for dir in &dirs {
        for path in playlists_in(dir)? {
            let renames = renames_for(root, dir, &path, &by_dir);
            let playlist = PlaylistFile::new(&path, dir);
            let changed = locks
                .with_lock(&path, || playlist.rename_entries(&renames))
                .with_context(|| format!("update playlist: {}", path.display()))?;
            if changed {
                report.playlists_updated += 1;
            }
        }
    }
    tracing::info!(
        renamed = report.renamed,
        playlists_updated = report.playlists_updated,
        "sanitize pass finished"
    );
    Ok(report)
}
