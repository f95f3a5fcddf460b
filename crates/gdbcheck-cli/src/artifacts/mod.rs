mod logging;
mod run;

pub use logging::init_run_logging;
pub use run::{RegistrySource, RunContext, RunOptions, RunPaths, start_run, write_json};

use thiserror::Error;

/// Errors while preparing or writing run artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type for artifact operations.
pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;
