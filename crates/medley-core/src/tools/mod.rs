//! External tool selection and command-line construction.
//!
//! The engine never fetches media itself: every job becomes a command line
//! for the music tool (search/sync driven) or the video tool (URL driven),
//! built here from the configuration and the on-disk playlist layout.

mod command;
mod deps;
mod listing;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use command::{build_command, listing_command, ToolCommand};
pub use deps::{find_in_path, verify_dependencies};
pub use listing::{into_batches, titles_from_listing};

/// Which external tool drives a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Music-platform downloader (search and playlist sync).
    Music,
    /// Video-platform downloader.
    Video,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Music => "music",
            Tool::Video => "video",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "music" | "spotdl" => Ok(Tool::Music),
            "video" | "yt-dlp" | "ytdlp" => Ok(Tool::Video),
            other => Err(format!("unknown tool: {other}")),
        }
    }
}

fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

fn is_music_host(host: &str) -> bool {
    host == "spotify.com" || host.ends_with(".spotify.com") || host == "spotify.link"
}

fn is_video_host(host: &str) -> bool {
    host == "youtu.be"
        || host == "youtube.com"
        || host.ends_with(".youtube.com")
}

/// Chooses the tool for a URL: music-platform links use the music tool,
/// video-platform links the video tool, everything else `default`.
pub fn determine_tool(url: &str, default: Tool) -> Tool {
    if let Some(host) = host_of(url) {
        if is_music_host(&host) {
            return Tool::Music;
        }
        if is_video_host(&host) {
            return Tool::Video;
        }
        return default;
    }
    // Not a parseable URL (e.g. `spotify:playlist:...` URIs or bare hosts).
    let lower = url.to_ascii_lowercase();
    if lower.contains("spotify") {
        Tool::Music
    } else if lower.contains("youtube") || lower.contains("youtu.be") {
        Tool::Video
    } else {
        default
    }
}

/// True for video-platform URLs naming a playlist (`/playlist` path or a `list=` parameter).
pub fn is_video_playlist(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str().map(|h| h.to_ascii_lowercase()) else {
        return false;
    };
    if !is_video_host(&host) {
        return false;
    }
    parsed.path().starts_with("/playlist")
        || parsed
            .query_pairs()
            .any(|(k, v)| k == "list" && !v.is_empty())
}
