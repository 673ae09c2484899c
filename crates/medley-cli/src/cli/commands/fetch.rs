//! `medley fetch` – run one batch and report per-job outcomes.

use anyhow::{bail, Context, Result};
use medley_core::config::EngineConfig;
use medley_core::{BatchInput, Engine, JobResult, Tool};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::observer::ConsoleObserver;

#[derive(Debug, Clone, Default)]
pub struct FetchArgs {
    pub items: Vec<String>,
    pub file: Option<PathBuf>,
    pub playlist: Option<String>,
    pub tool: Option<Tool>,
    pub titles: bool,
    pub json: bool,
}

/// Non-blank, non-comment lines of an input file, trimmed.
pub(crate) fn parse_input_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn read_input_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read input file: {}", path.display()))?;
    Ok(parse_input_lines(&text))
}

/// Batch inputs for the given items. Titles become a single title input
/// (the engine splits it into batches).
pub(crate) fn build_inputs(items: Vec<String>, tool: Option<Tool>, titles: bool) -> Vec<BatchInput> {
    if titles {
        return if items.is_empty() {
            Vec::new()
        } else {
            vec![BatchInput::Titles(items)]
        };
    }
    items
        .into_iter()
        .map(|url| match tool {
            Some(tool) => BatchInput::Forced { url, tool },
            None => BatchInput::Url(url),
        })
        .collect()
}

fn print_result(r: &JobResult) {
    let label = r.target.label();
    if r.is_success() {
        println!("  ok     {label} ({}, {} attempt(s))", r.tool, r.attempts);
    } else {
        println!("  failed {label} ({}, {} attempt(s))", r.tool, r.attempts);
        if let Some(summary) = &r.error_summary {
            for line in summary.lines() {
                println!("         {line}");
            }
        }
    }
}

pub async fn run_fetch(cfg: EngineConfig, args: FetchArgs) -> Result<()> {
    let mut items = args.items;
    if let Some(path) = &args.file {
        items.extend(read_input_file(path)?);
    }
    let inputs = build_inputs(items, args.tool, args.titles);
    if inputs.is_empty() {
        bail!("nothing to fetch: pass URLs, --titles, or --file");
    }

    let engine = Arc::new(Engine::new(cfg));
    let missing = engine.verify_dependencies();
    if !missing.is_empty() {
        tracing::warn!(?missing, "some tools were not found on PATH");
    }
    engine.subscribe(Arc::new(ConsoleObserver::new(args.json)));

    let worker = Arc::clone(&engine);
    let playlist = args.playlist.clone();
    let mut batch =
        tokio::task::spawn_blocking(move || worker.process_batch(inputs, playlist.as_deref()));

    let results = tokio::select! {
        joined = &mut batch => joined?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listen for Ctrl-C")?;
            eprintln!("Stopping, waiting for running tools to exit...");
            let stopper = Arc::clone(&engine);
            tokio::task::spawn_blocking(move || stopper.stop()).await?;
            batch.await?
        }
    };

    if args.json {
        for r in &results {
            println!("{}", serde_json::to_string(r)?);
        }
    } else {
        println!("Results:");
        results.iter().for_each(print_result);
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    tracing::info!(jobs = results.len(), failed, "fetch finished");
    if failed > 0 {
        bail!("{failed} job(s) failed");
    }
    Ok(())
}
