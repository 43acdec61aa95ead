use thiserror::Error;

/// Hard failures only. Out-of-bounds edit arguments are handled by silent
/// clamping or no-ops inside the operations; an error here means IO/serde
/// trouble or a broken structural invariant.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Structural invariant violated: {0}")]
    InvariantViolated(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
