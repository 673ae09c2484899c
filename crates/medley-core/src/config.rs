use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::tools::Tool;

/// Retry policy parameters (`[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per job (including the first).
    pub attempts: u32,
    /// Fixed delay in seconds between failed attempts.
    pub backoff_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff_seconds: 5,
        }
    }
}

/// Extra arguments appended verbatim to each tool's command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraToolArgs {
    pub music: Vec<String>,
    pub video: Vec<String>,
}

impl ExtraToolArgs {
    pub fn for_tool(&self, tool: Tool) -> &[String] {
        match tool {
            Tool::Music => &self.music,
            Tool::Video => &self.video,
        }
    }
}

/// Executable names (or paths) of the external tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolBinaries {
    pub music: String,
    pub video: String,
    /// Media metadata probe used for playlist durations.
    pub probe: String,
}

impl Default for ToolBinaries {
    fn default() -> Self {
        Self {
            music: "spotdl".to_string(),
            video: "yt-dlp".to_string(),
            probe: "ffprobe".to_string(),
        }
    }
}

impl ToolBinaries {
    pub fn for_tool(&self, tool: Tool) -> &str {
        match tool {
            Tool::Music => &self.music,
            Tool::Video => &self.video,
        }
    }
}

/// Trailer phrases that turn a nonzero exit into a success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftSuccessConfig {
    /// Music tool: sync/save state persisted.
    pub music: Vec<String>,
    /// Video tool: playlist finished with some items unavailable.
    pub video: Vec<String>,
}

impl Default for SoftSuccessConfig {
    fn default() -> Self {
        Self {
            music: vec!["Saved sync file".to_string(), "Saved results to".to_string()],
            video: vec!["Finished downloading playlist".to_string()],
        }
    }
}

impl SoftSuccessConfig {
    pub fn for_tool(&self, tool: Tool) -> &[String] {
        match tool {
            Tool::Music => &self.music,
            Tool::Video => &self.video,
        }
    }
}

/// Default phrases of benign extractor chatter that never reach the log.
pub fn default_noise() -> Vec<String> {
    [
        "SABR streaming",
        "web_safari client",
        "web client",
        "missing a url",
        "JavaScript runtime",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_orphan_patterns() -> Vec<String> {
    ["spotdl", "yt-dlp", "ffmpeg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Global configuration loaded from `~/.config/medley/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root directory for all downloaded media and playlist files.
    pub output_dir: PathBuf,
    /// Audio container requested from the music tool.
    pub format: String,
    /// Audio bitrate requested from the music tool.
    pub bitrate: String,
    /// Number of worker threads.
    pub concurrency: usize,
    /// Run a single worker regardless of `concurrency` (upstream rate limits).
    pub force_single_worker: bool,
    /// Tool used for URLs that are neither music- nor video-platform links.
    pub default_tool: Tool,
    /// Credentials/cookie file handed to the tools when it exists.
    pub cookie_file: Option<PathBuf>,
    pub lyrics_provider: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Titles per music-tool invocation when expanding video playlists.
    pub batch_size: usize,
    /// Diagnostic phrases suppressed from logs.
    pub noise: Vec<String>,
    /// Command-line substrings swept by the orphan reaper on stop.
    pub orphan_patterns: Vec<String>,
    pub retry: RetryConfig,
    pub extra_tool_args: ExtraToolArgs,
    pub tools: ToolBinaries,
    pub soft_success: SoftSuccessConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./downloads"),
            format: "mp3".to_string(),
            bitrate: "320k".to_string(),
            concurrency: 1,
            force_single_worker: true,
            default_tool: Tool::Music,
            cookie_file: None,
            lyrics_provider: "genius".to_string(),
            client_id: None,
            client_secret: None,
            batch_size: 50,
            noise: default_noise(),
            orphan_patterns: default_orphan_patterns(),
            retry: RetryConfig::default(),
            extra_tool_args: ExtraToolArgs::default(),
            tools: ToolBinaries::default(),
            soft_success: SoftSuccessConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Worker count actually used by the pool.
    pub fn effective_concurrency(&self) -> usize {
        if self.force_single_worker {
            1
        } else {
            self.concurrency.max(1)
        }
    }

    /// Music-platform credentials; environment variables win over the file.
    pub fn credentials(&self) -> Option<(String, String)> {
        let id = std::env::var("SPOTIFY_CLIENT_ID")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.client_id.clone())?;
        let secret = std::env::var("SPOTIFY_CLIENT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.client_secret.clone())?;
        if id.is_empty() || secret.is_empty() || id == "********" {
            return None;
        }
        Some((id, secret))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("medley")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EngineConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = EngineConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
