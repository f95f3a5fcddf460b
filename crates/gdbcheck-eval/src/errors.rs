use thiserror::Error;

/// Errors emitted by the validation engine.
///
/// Findings about the store never surface here; they are report content.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Core(#[from] gdbcheck_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
