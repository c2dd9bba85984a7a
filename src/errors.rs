use thiserror::Error;

/// Why a submitted message was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,
    #[error("message is required")]
    EmptyText,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached. Hosts fall back to a static
    /// list when listing fails with this.
    #[error("message store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Wrong or missing admin key.
    #[error("forbidden")]
    Forbidden,
    #[error("message not found")]
    NotFound,
    /// The largest stored id is `i64::MAX`, so no larger id exists.
    #[error("no message id left after {0}")]
    IdsExhausted(i64),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
