use thiserror::Error;

/// Validation and contract errors exposed by `coinsnap-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("asset id cannot be empty")]
    EmptyAssetId,
    #[error("asset id length {len} exceeds max {max}")]
    AssetIdTooLong { len: usize, max: usize },
    #[error("asset id contains invalid character '{ch}' at index {index}")]
    AssetIdInvalidChar { ch: char, index: usize },
    #[error("asset list cannot be empty")]
    EmptyAssetList,

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
}

/// Top-level error type for core operations that cross module boundaries.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Fetch(#[from] crate::failover::FetchError),

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    #[error("background task failed: {0}")]
    Task(String),
}
