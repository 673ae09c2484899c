//! Media duration lookup.

use std::path::Path;
use std::process::{Command, Stdio};

/// Source of media durations for playlist entries.
pub trait DurationProbe: Send + Sync {
    /// Whole seconds, or `None` when the file cannot be probed.
    fn duration_secs(&self, path: &Path) -> Option<u64>;
}

/// Runs ffprobe (or a compatible binary) once per file.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DurationProbe for FfprobeProbe {
    fn duration_secs(&self, path: &Path) -> Option<u64> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();
        match output {
            Ok(out) if out.status.success() => parse_duration(&String::from_utf8_lossy(&out.stdout)),
            Ok(out) => {
                tracing::debug!(path = %path.display(), status = %out.status, "duration probe failed");
                None
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), "duration probe unavailable: {e}");
                None
            }
        }
    }
}

/// Parses probe output such as `"213.471000\n"` into rounded seconds.
pub fn parse_duration(s: &str) -> Option<u64> {
    let secs: f64 = s.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| secs.round() as u64)
}
