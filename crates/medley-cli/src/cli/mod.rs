//! CLI for the medley fetch orchestrator.

mod commands;
mod observer;

use anyhow::Result;
use clap::{Parser, Subcommand};
use medley_core::config::{self, EngineConfig};
use medley_core::Tool;
use std::path::{Path, PathBuf};

use commands::{run_check, run_config, run_fetch, run_sanitize, FetchArgs};

/// Top-level CLI for medley.
#[derive(Debug, Parser)]
#[command(name = "medley")]
#[command(about = "medley: fetch music and video through spotdl and yt-dlp", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/medley/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch URLs (or search titles) as one batch.
    Fetch {
        /// URLs to fetch, or search titles with --titles.
        items: Vec<String>,

        /// Read additional items from a file, one per line (`#` starts a comment).
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Playlist folder and M3U8 file to collect the downloads in.
        #[arg(long, value_name = "NAME")]
        playlist: Option<String>,

        /// Force a tool (music|video) instead of picking one per URL.
        #[arg(long, value_name = "TOOL")]
        tool: Option<Tool>,

        /// Treat items as free-text search titles for the music tool.
        #[arg(long, conflicts_with = "tool")]
        titles: bool,

        /// Override the configured output directory.
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Print engine events as JSON lines instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Rename existing downloads to safe ASCII names and fix playlists.
    Sanitize,

    /// Verify that the external tools are installed.
    Check,

    /// Print the config file location and effective settings.
    Config,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let cfg = match path {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;

        match cli.command {
            CliCommand::Fetch {
                items,
                file,
                playlist,
                tool,
                titles,
                output_dir,
                json,
            } => {
                let args = FetchArgs {
                    items,
                    file,
                    playlist,
                    tool,
                    titles,
                    json,
                };
                let mut cfg = cfg;
                if let Some(dir) = output_dir {
                    cfg.output_dir = dir;
                }
                run_fetch(cfg, args).await?
            }
            CliCommand::Sanitize => run_sanitize(cfg).await?,
            CliCommand::Check => run_check(&cfg)?,
            CliCommand::Config => run_config(&cfg, cli.config.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
