//! Last-resort cleanup of tool processes that escaped group tracking.

use std::fs;
use std::path::{Path, PathBuf};

use super::signal::kill_pid;

/// Kills stray processes whose command line matches a pattern.
pub trait ProcessReaper: Send + Sync {
    /// Returns the number of processes signalled.
    fn sweep(&self, patterns: &[String]) -> usize;
}

/// Reaper that never touches anything (tests, platforms without `/proc`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReaper;

impl ProcessReaper for NoopReaper {
    fn sweep(&self, _patterns: &[String]) -> usize {
        0
    }
}

/// Scans a procfs tree for processes owned by the current user.
#[derive(Debug, Clone)]
pub struct ProcfsReaper {
    root: PathBuf,
}

impl Default for ProcfsReaper {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcfsReaper {
    pub fn new() -> Self {
        Self::at("/proc")
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// PIDs owned by this user whose command line contains any pattern.
    /// Our own process and its parent are never returned.
    pub fn find_orphans(&self, patterns: &[String]) -> Vec<u32> {
        let patterns: Vec<&str> = patterns
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .collect();
        if patterns.is_empty() {
            return Vec::new();
        }
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let me = std::process::id();
        let parent = parent_pid();
        let uid = current_uid();

        let mut found = Vec::new();
        for entry in entries.flatten() {
            let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
                continue;
            };
            if pid == me || Some(pid) == parent {
                continue;
            }
            let dir = entry.path();
            if !owned_by(&dir, uid) {
                continue;
            }
            let Some(cmdline) = read_cmdline(&dir) else {
                continue;
            };
            if patterns.iter().any(|p| cmdline.contains(p)) {
                found.push(pid);
            }
        }
        found.sort_unstable();
        found
    }
}

impl ProcessReaper for ProcfsReaper {
    fn sweep(&self, patterns: &[String]) -> usize {
        self.find_orphans(patterns)
            .into_iter()
            .filter(|&pid| {
                let killed = kill_pid(pid);
                if killed {
                    tracing::warn!(pid, "killed orphaned tool process");
                }
                killed
            })
            .count()
    }
}

/// Procfs reaper where `/proc` exists, otherwise a no-op.
pub fn default_reaper() -> Box<dyn ProcessReaper> {
    if cfg!(target_os = "linux") && Path::new("/proc/self").exists() {
        Box::new(ProcfsReaper::new())
    } else {
        Box::new(NoopReaper)
    }
}

/// Kernel threads have an empty command line and are skipped.
fn read_cmdline(dir: &Path) -> Option<String> {
    let raw = fs::read(dir.join("cmdline")).ok()?;
    if raw.is_empty() {
        return None;
    }
    let joined: Vec<u8> = raw
        .into_iter()
        .map(|b| if b == 0 { b' ' } else { b })
        .collect();
    Some(String::from_utf8_lossy(&joined).trim_end().to_string())
}

#[cfg(unix)]
fn current_uid() -> Option<u32> {
    // SAFETY: getuid has no preconditions and cannot fail.
    Some(unsafe { libc::getuid() })
}

#[cfg(not(unix))]
fn current_uid() -> Option<u32> {
    None
}

#[cfg(unix)]
fn parent_pid() -> Option<u32> {
    Some(std::os::unix::process::parent_id())
}

#[cfg(not(unix))]
fn parent_pid() -> Option<u32> {
    None
}

/// Unknown ownership never matches.
fn owned_by(dir: &Path, uid: Option<u32>) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (fs::metadata(dir), uid) {
            (Ok(meta), Some(uid)) => meta.uid() == uid,
            _ => false,
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (dir, uid);
        false
    }
}
