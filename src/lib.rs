pub mod core;
pub mod engine;
pub mod parse;
pub mod storage;

pub mod projects_cmd;
pub mod run_cmd;
pub mod versions_cmd;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("{0}")]
    Message(String),
    /// Unsupported family/device/toolchain/project; raised before any stage is spawned.
    #[error("unsupported configuration: {0}")]
    Config(String),
    /// An external tool exited non-zero.
    #[error("`{stage}` failed with {status}{}", log_hint(.log))]
    CommandFailed {
        stage: String,
        status: String,
        /// Stage log holding the captured output, when there is one.
        log: Option<PathBuf>,
    },
    /// An external tool could not be started at all.
    #[error("failed to spawn `{program}` for stage `{stage}`: {source}")]
    Spawn {
        stage: String,
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;

fn log_hint(log: &Option<PathBuf>) -> String {
    log.as_ref()
        .map(|p| format!(" (log: {})", p.display()))
        .unwrap_or_default()
}

impl BenchError {
    /// True for failures of an external tool (non-zero exit or failed spawn).
    pub fn is_command_failure(&self) -> bool {
        matches!(self, BenchError::CommandFailed { .. } | BenchError::Spawn { .. })
    }
}
