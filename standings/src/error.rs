//! Error types for storage and engine operations.

/// Failure reported by a repository implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backing store is not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A query or write failed
    #[error("Query failed: {0}")]
    Query(String),

    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Failure of a whole reconciliation run or leaderboard request.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Storage error outside per-participant work
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Operation exceeded its time budget
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: &'static str, after_ms: u64 },

    /// Engine configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
