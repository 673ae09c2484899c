//! `medley sanitize` – normalize names of already downloaded files.

use anyhow::Result;
use medley_core::config::EngineConfig;
use medley_core::Engine;

pub async fn run_sanitize(cfg: EngineConfig) -> Result<()> {
    let root = cfg.output_dir.clone();
    let engine = Engine::new(cfg);
    let report = tokio::task::spawn_blocking(move || engine.sanitize_existing_files()).await??;
    println!(
        "Renamed {} file(s), updated {} playlist(s) under {}",
        report.renamed,
        report.playlists_updated,
        root.display()
    );
    Ok(())
}
