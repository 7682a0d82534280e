//! The session entry type.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Opaque session payload: string keys mapped to arbitrary JSON values.
///
/// The store never interprets values — it clones them out on reads and
/// replaces them wholesale on updates.
pub type Payload = HashMap<String, serde_json::Value>;

/// One entry in the session table.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    /// Client payload.
    pub(crate) data: Payload,

    /// Last successful payload write. Reads do not refresh this, so it is
    /// monotonically non-decreasing for the life of the entry.
    pub(crate) last_used: Instant,

    /// Creation timestamp, informational only.
    pub(crate) created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session with an empty payload.
    pub(crate) fn new() -> Self {
        Self {
            data: Payload::new(),
            last_used: Instant::now(),
            created_at: Utc::now(),
        }
    }

    /// Whether this session has been idle for at least `timeout` as of `now`.
    pub(crate) fn is_idle(&self, timeout: Duration, now: Instant) -> bool {
        now.duration_since(self.last_used) >= timeout
    }
}
