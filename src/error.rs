//! Error types for session store operations.

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session was not found in the table, either because it never existed
    /// or because it was already evicted. The store does not distinguish
    /// the two.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The ID source failed to produce a new session ID.
    #[error("Session ID generation failed: {0}")]
    IdGeneration(String),
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
