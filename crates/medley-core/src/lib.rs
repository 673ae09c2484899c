pub mod config;
pub mod logging;

pub mod control;
pub mod engine;
pub mod naming;
pub mod parser;
pub mod playlist;
pub mod retry;
pub mod status;
pub mod supervisor;
pub mod tools;

pub use engine::{BatchInput, BatchReport, Engine, JobResult, JobStatus, SanitizeReport, Target};
pub use status::{EngineEvent, EngineState, StatusObserver, StatusRecord};
pub use tools::Tool;
