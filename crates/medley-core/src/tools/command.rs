//! Tool command lines.

use std::fmt;
use std::path::Path;
use std::process::Command;

use crate::config::EngineConfig;
use crate::engine::Target;
use crate::playlist::PlaylistLayout;

use super::Tool;

/// A fully built tool invocation. Kept as data so it can be logged and tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub tool: Tool,
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<I, S>(tool: Tool, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tool,
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `std::process::Command` for this invocation (no stdio configured).
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    fn push(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    fn push_pair(&mut self, flag: &str, value: impl Into<String>) {
        self.args.push(flag.to_string());
        self.args.push(value.into());
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// A title as a positional search argument. Leading dashes would read as
/// flags to the tool, so they are dropped; nothing is left of a title made
/// only of dashes.
fn search_query(title: &str) -> Option<&str> {
    let query = title.trim_start_matches(|c: char| c == '-' || c.is_whitespace());
    (!query.is_empty()).then_some(query)
}

fn path_arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

/// Existing cookie file, or None (with a warning when configured but missing).
fn cookie_file(cfg: &EngineConfig) -> Option<String> {
    let path = cfg.cookie_file.as_deref()?;
    if path.is_file() {
        Some(path_arg(path))
    } else {
        tracing::warn!(path = %path.display(), "cookie file not found, continuing without it");
        None
    }
}

/// Builds the command for one job.
///
/// Music tool: single transcode thread, ASCII-restricted filenames, output
/// `{media_dir}/{artist} - {title}.{ext}`. URL targets run in sync mode
/// with a save-state file and the tool's own playlist flag; title batches
/// run in search mode without either (playlist entries are then appended
/// from parsed completion lines).
pub fn build_command(
    cfg: &EngineConfig,
    tool: Tool,
    target: &Target,
    layout: &PlaylistLayout,
) -> ToolCommand {
    match tool {
        Tool::Music => music_command(cfg, target, layout),
        Tool::Video => video_command(cfg, target, layout),
    }
}

fn music_command(cfg: &EngineConfig, target: &Target, layout: &PlaylistLayout) -> ToolCommand {
    let mut cmd = ToolCommand::new(Tool::Music, cfg.tools.music.clone(), Vec::<String>::new());
    match target {
        Target::Url(url) => {
            cmd.push("sync");
            cmd.push(url.clone());
            cmd.push_pair("--save-file", path_arg(&layout.save_state_file(url)));
            if let Some(m3u) = layout.active_playlist_file() {
                cmd.push_pair("--m3u", path_arg(&m3u));
            }
        }
        Target::Titles(titles) => {
            cmd.push("download");
            for query in titles.iter().filter_map(|t| search_query(t)) {
                cmd.push(query);
            }
        }
    }
    let template = layout.media_dir().join("{artist} - {title}.{output-ext}");
    cmd.push_pair("--output", path_arg(&template));
    cmd.push_pair("--format", cfg.format.clone());
    cmd.push_pair("--bitrate", cfg.bitrate.clone());
    // Parallel transcoding from this tool corrupts output.
    cmd.push_pair("--threads", "1");
    cmd.push_pair("--restrict", "ascii");
    cmd.push_pair("--lyrics", cfg.lyrics_provider.clone());
    cmd.push("--no-cache");
    if let Some((id, secret)) = cfg.credentials() {
        cmd.push_pair("--client-id", id);
        cmd.push_pair("--client-secret", secret);
    }
    if let Some(cookies) = cookie_file(cfg) {
        cmd.push_pair("--cookie-file", cookies);
    }
    cmd.args
        .extend(cfg.extra_tool_args.for_tool(Tool::Music).iter().cloned());
    cmd
}

fn video_command(cfg: &EngineConfig, target: &Target, layout: &PlaylistLayout) -> ToolCommand {
    let mut cmd = ToolCommand::new(Tool::Video, cfg.tools.video.clone(), Vec::<String>::new());
    match target {
        Target::Url(url) => cmd.push(url.clone()),
        Target::Titles(titles) => {
            for title in titles {
                cmd.push(format!("ytsearch1:{title}"));
            }
        }
    }
    cmd.push_pair("-P", path_arg(&layout.media_dir()));
    cmd.push_pair("-o", "%(title)s.%(ext)s");
    cmd.push("--restrict-filenames");
    cmd.push("--newline");
    cmd.push("--no-colors");
    if let Some(cookies) = cookie_file(cfg) {
        cmd.push_pair("--cookies", cookies);
    }
    cmd.args
        .extend(cfg.extra_tool_args.for_tool(Tool::Video).iter().cloned());
    cmd
}

/// Metadata-only listing of a video playlist: one title per line, nothing downloaded.
pub fn listing_command(cfg: &EngineConfig, url: &str) -> ToolCommand {
    let mut cmd = ToolCommand::new(
        Tool::Video,
        cfg.tools.video.clone(),
        ["--flat-playlist", "--print", "%(title)s", "--ignore-errors", "--no-warnings"],
    );
    if let Some(cookies) = cookie_file(cfg) {
        cmd.push_pair("--cookies", cookies);
    }
    cmd.push(url.to_string());
    cmd
}
