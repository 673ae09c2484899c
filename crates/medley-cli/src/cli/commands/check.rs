//! `medley check` – report missing external tools.

use anyhow::{bail, Result};
use medley_core::config::EngineConfig;
use medley_core::tools::verify_dependencies;

pub fn run_check(cfg: &EngineConfig) -> Result<()> {
    let missing = verify_dependencies(&cfg.tools);
    for program in [&cfg.tools.music, &cfg.tools.video, &cfg.tools.probe] {
        let state = if missing.contains(program) { "missing" } else { "ok" };
        println!("{:<8} {}", state, program);
    }
    if !missing.is_empty() {
        bail!("{} tool(s) not found: {}", missing.len(), missing.join(", "));
    }
    Ok(())
}
