//! Session ID generation.

use uuid::Uuid;

use crate::error::Result;

/// Source of unique session identifiers.
///
/// Implementations must return values unique with overwhelming probability
/// across the process lifetime. A failure is surfaced from
/// `create_session`; the store never retries on its own — the caller
/// decides whether to retry.
pub trait IdSource: Send + Sync {
    /// Produce a new unique session ID.
    fn next_id(&self) -> Result<String>;
}

/// Default ID source backed by random (v4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&self) -> Result<String> {
        Ok(Uuid::new_v4().to_string())
    }
}
