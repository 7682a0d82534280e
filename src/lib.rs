//! Concurrent in-memory session table with idle-timeout eviction.
//!
//! A [`SessionStore`] maps opaque session IDs to mutable payloads and
//! tracks a last-write timestamp per session. A background sweeper, started
//! with the store, wakes once per quantum and evicts every session idle for
//! at least the configured timeout — so a session last written at `t`
//! disappears between `t + idle_timeout` and
//! `t + idle_timeout + sweep_interval`.
//!
//! Reads return snapshots and do not postpone eviction; only writes refresh
//! a session's recency.
//!
//! # Example
//!
//! ```rust,ignore
//! use session_table::{SessionStore, StoreConfig};
//! use std::time::Duration;
//!
//! let config = StoreConfig::new()
//!     .with_idle_timeout(Duration::from_secs(5))
//!     .with_sweep_interval(Duration::from_secs(1));
//!
//! let store = SessionStore::new(config);
//! let id = store.create_session().await?;
//! store.update_session_data(&id, payload).await?;
//! let snapshot = store.get_session_data(&id).await?;
//! store.shutdown().await;
//! ```

mod config;
mod error;
mod id;
mod observer;
mod session;
mod store;
mod sweeper;

pub use config::{DEFAULT_IDLE_TIMEOUT, DEFAULT_SWEEP_INTERVAL, StoreConfig};
pub use error::{Error, Result};
pub use id::{IdSource, UuidSource};
pub use observer::{NoopObserver, SessionObserver};
pub use session::Payload;
pub use store::SessionStore;
