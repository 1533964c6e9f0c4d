use thiserror::Error;

/// Persistence failures. Logged and tolerated by callers: in-memory state
/// stays the source of truth.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

/// Why a nutrition estimate could not be produced.
#[derive(Debug, Error)]
pub enum EstimationError {
    #[error("meal description is empty")]
    BlankDescription,
    #[error("estimation request failed: {0}")]
    Transport(String),
    #[error("estimation service returned status {0}")]
    Status(u16),
    #[error("estimation response has no text content")]
    MissingContent,
    #[error("estimation response is not valid nutrition data: {0}")]
    Validation(String),
}

impl EstimationError {
    /// Blank input is rejected up front; everything else is worth another try.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::BlankDescription)
    }
}
