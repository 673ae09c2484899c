//! CLI command handlers, one file per subcommand.

mod check;
pub(super) mod config;
pub(super) mod fetch;
mod sanitize;

pub use check::run_check;
pub use config::run_config;
pub use fetch::{run_fetch, FetchArgs};
pub use sanitize::run_sanitize;
