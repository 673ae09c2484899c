//! `medley config` – show where settings come from and their effective values.

use anyhow::Result;
use medley_core::config::{self, EngineConfig};
use std::path::Path;

/// Effective config as TOML with the client secret masked.
pub(crate) fn render_config(cfg: &EngineConfig) -> Result<String> {
    let mut shown = cfg.clone();
    if shown.client_secret.is_some() {
        shown.client_secret = Some("********".to_string());
    }
    Ok(toml::to_string_pretty(&shown)?)
}

pub fn run_config(cfg: &EngineConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", render_config(cfg)?);
    Ok(())
}
