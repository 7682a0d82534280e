//! Observer hooks for session lifecycle events.
//!
//! This module decouples the store from any particular observability
//! backend. The store reports creation and eviction events through the
//! [`SessionObserver`] trait; callbacks fire outside the table lock so an
//! observer can never block client operations or the sweeper's scan.

/// Trait for session lifecycle observers.
///
/// All methods have no-op defaults; implement only the events of interest.
/// Callbacks run on the calling task (or on the sweeper task, for
/// evictions) and are fire-and-forget — hand anything expensive off to a
/// channel rather than doing it inline.
pub trait SessionObserver: Send + Sync {
    /// Called after a session has been inserted into the table.
    fn on_created(&self, _session_id: &str) {}

    /// Called after the sweeper has removed an idle session.
    fn on_evicted(&self, _session_id: &str) {}
}

/// An observer that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
