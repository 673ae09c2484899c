//! Shared fixtures for engine integration tests.
//!
//! Real tool binaries are replaced by small `sh` scripts written into a
//! temp directory. The fake music tool appends its argv to `args.log`
//! so tests can assert on the command lines the engine produced.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use medley_core::config::EngineConfig;
use medley_core::control::NoopReaper;
use medley_core::playlist::DurationProbe;
use medley_core::status::EngineEvent;
use medley_core::Engine;
use tempfile::TempDir;

/// Duration reported for every probed file.
pub const PROBED_SECS: u64 = 180;

pub struct FixedProbe;

impl DurationProbe for FixedProbe {
    fn duration_secs(&self, _path: &Path) -> Option<u64> {
        Some(PROBED_SECS)
    }
}

/// Music tool stand-in.
///
/// `download t1 t2 ...` creates `{dir}/{t}.mp3` per title and prints the
/// real tool's completion line, or its skip line when the file exists.
/// Titles containing "Missing" print a lookup failure instead. `sync URL`
/// announces two songs and appends absolute paths to the `--m3u` file.
pub fn music_script(args_log: &Path) -> String {
    format!(
        r#"echo "$@" >> "{log}"
mode="$1"; shift
dir="."; m3u=""; prev=""
for a in "$@"; do
  case "$prev" in
    --output) dir=$(dirname "$a") ;;
    --m3u) m3u="$a" ;;
  esac
  prev="$a"
done
mkdir -p "$dir"
if [ "$mode" = "sync" ]; then
  echo "Found 2 songs in Synced Mix (Playlist)"
  set -- "Sync Artist - One" "Sync Artist - Two"
fi
for t in "$@"; do
  case "$t" in --*) break ;; esac
  case "$t" in *Missing*) echo "LookupError: No results found for song: $t"; continue ;; esac
  if [ -f "$dir/$t.mp3" ]; then
    echo "Skipping $t (file already exists) (duplicate)"
  else
    echo "Downloading \"$t\""
    : > "$dir/$t.mp3"
    echo "Downloaded \"$t\": https://example.invalid/track"
  fi
  if [ -n "$m3u" ]; then echo "$dir/$t.mp3" >> "$m3u"; fi
done
"#,
        log = args_log.display()
    )
}

/// Video tool stand-in that only supports playlist listing.
pub const VIDEO_LISTING_SCRIPT: &str = r#"for a in "$@"; do
  if [ "$a" = "--flat-playlist" ]; then
    echo "Artist - One (Official Video)"
    echo "[Deleted video]"
    echo "Artist - Two [HD]"
    echo "Artist - Three (Lyrics)"
    exit 0
  fi
done
echo "ERROR: unsupported invocation"
exit 1
"#;

pub struct Sandbox {
    _dir: TempDir,
    pub root: PathBuf,
    pub output: PathBuf,
    pub args_log: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let output = root.join("library");
        fs::create_dir_all(root.join("bin")).unwrap();
        Self {
            args_log: root.join("args.log"),
            _dir: dir,
            root,
            output,
        }
    }

    /// Writes an executable `sh` script under `bin/` and returns its path.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root.join("bin").join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Config with both tools unavailable, single attempts, and no backoff.
    pub fn config(&self) -> EngineConfig {
        let mut cfg = EngineConfig {
            output_dir: self.output.clone(),
            batch_size: 2,
            ..EngineConfig::default()
        };
        cfg.retry.attempts = 1;
        cfg.retry.backoff_seconds = 0;
        cfg.tools.music = self.root.join("bin/missing-music").display().to_string();
        cfg.tools.video = self.root.join("bin/missing-video").display().to_string();
        cfg.tools.probe = self.root.join("bin/missing-probe").display().to_string();
        cfg
    }

    /// Config wired to the standard fake music and video tools.
    pub fn fake_tools_config(&self) -> EngineConfig {
        let mut cfg = self.config();
        let music = self.script("music", &music_script(&self.args_log));
        let video = self.script("video", VIDEO_LISTING_SCRIPT);
        cfg.tools.music = music.display().to_string();
        cfg.tools.video = video.display().to_string();
        cfg
    }

    pub fn engine(&self, cfg: EngineConfig) -> Engine {
        Engine::new(cfg)
            .with_reaper(Box::new(NoopReaper))
            .with_probe(Box::new(FixedProbe))
            .with_stop_grace(Duration::from_millis(300))
    }

    /// One line per fake music tool invocation.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.args_log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.output.join(relative)).unwrap()
    }
}

/// Polls `cond` until it holds or `timeout` passes.
pub fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    cond()
}

/// Log messages received so far.
pub fn drain_logs(rx: &Receiver<EngineEvent>) -> Vec<String> {
    rx.try_iter()
        .filter_map(|event| match event {
            EngineEvent::Log(log) => Some(log.message),
            EngineEvent::Status(_) => None,
        })
        .collect()
}
