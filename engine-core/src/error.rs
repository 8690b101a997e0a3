use thiserror::Error;

/// Errors shared across the extraction and matching engines.
///
/// Per-row and per-page failures are never errors: they are recovered locally
/// and surfaced as structured anomaly data alongside the partial result. Only
/// document- and project-level preconditions raise.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No registered adapter recognized the document. The caller must prompt
    /// for manual bank selection; the engine never guesses silently.
    #[error("unknown bank: no adapter matched the document")]
    UnknownBank { supported: Vec<String> },

    /// The operation was cancelled cooperatively. Partial results already
    /// validated are returned separately by the batch layer.
    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
