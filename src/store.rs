//! The session store: a shared table of sessions with background idle
//! eviction.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::id::{IdSource, UuidSource};
use crate::observer::{NoopObserver, SessionObserver};
use crate::session::{Payload, Session};
use crate::sweeper::{SweeperHandle, Table};

/// Concurrent session table with background idle eviction.
///
/// All access funnels through the store's methods; a single reader/writer
/// lock guards the table as a whole. Reads clone the payload out under the
/// shared lock, writes replace it under the exclusive lock, and the sweeper
/// takes the exclusive lock once per pass — so a sweep and a client
/// operation never interleave within a single table access.
///
/// Cloning the store is cheap and every clone operates on the same table,
/// which is how client tasks are expected to share it.
///
/// The constructor spawns the sweeper, so the store must be created inside
/// a tokio runtime. [`SessionStore::shutdown`] is the only cancellation
/// path and is idempotent.
pub struct SessionStore<I: IdSource = UuidSource, O: SessionObserver = NoopObserver> {
    table: Table,
    ids: Arc<I>,
    observer: Arc<O>,
    config: StoreConfig,
    sweeper: Arc<Mutex<Option<SweeperHandle>>>,
}

impl SessionStore {
    /// Create a store with UUID session IDs and no observer, and start its
    /// sweeper.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_parts(config, UuidSource, NoopObserver)
    }
}

impl<I, O> SessionStore<I, O>
where
    I: IdSource,
    O: SessionObserver + 'static,
{
    /// Create a store with an explicit ID source and observer, and start
    /// its sweeper.
    pub fn with_parts(config: StoreConfig, ids: I, observer: O) -> Self {
        let table: Table = Arc::new(RwLock::new(HashMap::new()));
        let observer = Arc::new(observer);
        let sweeper =
            SweeperHandle::spawn(Arc::clone(&table), Arc::clone(&observer), config.clone());

        Self {
            table,
            ids: Arc::new(ids),
            observer,
            config,
            sweeper: Arc::new(Mutex::new(Some(sweeper))),
        }
    }

    /// Get the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current number of sessions in the table.
    pub async fn len(&self) -> usize {
        self.table.read().await.len()
    }

    /// Check if the table is empty.
    pub async fn is_empty(&self) -> bool {
        self.table.read().await.is_empty()
    }

    /// Create a new session with an empty payload and return its ID.
    ///
    /// Fails with [`Error::IdGeneration`] if the ID source fails; nothing
    /// is inserted in that case.
    pub async fn create_session(&self) -> Result<String> {
        let session_id = self.ids.next_id()?;

        self.table
            .write()
            .await
            .insert(session_id.clone(), Session::new());

        debug!(session_id = %session_id, "Session created");
        self.observer.on_created(&session_id);

        Ok(session_id)
    }

    /// Return a snapshot of the session's payload.
    ///
    /// Reads do not refresh the idle clock: recency is write-driven, so a
    /// session that is only read still expires `idle_timeout` after its
    /// last write. Fails with [`Error::NotFound`] if the ID is absent,
    /// whether it never existed or was already evicted.
    pub async fn get_session_data(&self, session_id: &str) -> Result<Payload> {
        let table = self.table.read().await;
        match table.get(session_id) {
            Some(session) => {
                trace!(session_id = %session_id, "Session read");
                Ok(session.data.clone())
            }
            None => Err(Error::NotFound(session_id.to_string())),
        }
    }

    /// Replace the session's payload wholesale and reset its idle clock.
    ///
    /// The existence check and the write happen under one exclusive lock
    /// acquisition, so an update can never resurrect a session the sweeper
    /// evicted in the meantime. Fails with [`Error::NotFound`] if the ID is
    /// absent at write time.
    pub async fn update_session_data(&self, session_id: &str, data: Payload) -> Result<()> {
        let mut table = self.table.write().await;
        match table.get_mut(session_id) {
            Some(session) => {
                session.data = data;
                session.last_used = Instant::now();
                trace!(session_id = %session_id, "Session updated");
                Ok(())
            }
            None => Err(Error::NotFound(session_id.to_string())),
        }
    }

    /// Remove a session explicitly, returning its final payload.
    ///
    /// Same locking discipline as update. Fails with [`Error::NotFound`]
    /// if the ID is absent.
    pub async fn remove_session(&self, session_id: &str) -> Result<Payload> {
        let mut table = self.table.write().await;
        match table.remove(session_id) {
            Some(session) => {
                debug!(session_id = %session_id, "Session removed");
                Ok(session.data)
            }
            None => Err(Error::NotFound(session_id.to_string())),
        }
    }

    /// Stop the background sweeper and wait for it to exit.
    ///
    /// Idempotent: the first call stops the sweeper, later calls are
    /// no-ops. After shutdown the table stays usable, but nothing evicts
    /// idle sessions anymore.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.stop().await;
            debug!("Session store shut down");
        }
    }
}

impl<I: IdSource, O: SessionObserver> Clone for SessionStore<I, O> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            ids: Arc::clone(&self.ids),
            observer: Arc::clone(&self.observer),
            config: self.config.clone(),
            sweeper: Arc::clone(&self.sweeper),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn payload(key: &str, value: &str) -> Payload {
        let mut data = Payload::new();
        data.insert(key.to_string(), json!(value));
        data
    }

    #[tokio::test]
    async fn test_create_then_get_returns_empty_payload() {
        let store = SessionStore::new(StoreConfig::new());

        let id = store.create_session().await.unwrap();
        let data = store.get_session_data(&id).await.unwrap();

        assert!(data.is_empty());
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_update_then_get_round_trips() {
        let store = SessionStore::new(StoreConfig::new());
        let id = store.create_session().await.unwrap();

        store
            .update_session_data(&id, payload("website", "example.org"))
            .await
            .unwrap();

        let data = store.get_session_data(&id).await.unwrap();
        assert_eq!(data, payload("website", "example.org"));
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let store = SessionStore::new(StoreConfig::new());

        let result = store.get_session_data("nonexistent").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = SessionStore::new(StoreConfig::new());

        let result = store.update_session_data("nonexistent", Payload::new()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_remove_returns_final_payload() {
        let store = SessionStore::new(StoreConfig::new());
        let id = store.create_session().await.unwrap();
        store
            .update_session_data(&id, payload("k", "v"))
            .await
            .unwrap();

        let removed = store.remove_session(&id).await.unwrap();
        assert_eq!(removed, payload("k", "v"));

        assert!(matches!(
            store.get_session_data(&id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.remove_session(&id).await,
            Err(Error::NotFound(_))
        ));
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_id_generation_inserts_nothing() {
        struct ExhaustedSource;

        impl IdSource for ExhaustedSource {
            fn next_id(&self) -> Result<String> {
                Err(Error::IdGeneration("entropy source exhausted".to_string()))
            }
        }

        let store = SessionStore::with_parts(StoreConfig::new(), ExhaustedSource, NoopObserver);

        let result = store.create_session().await;
        assert!(matches!(result, Err(Error::IdGeneration(_))));
        assert!(store.is_empty().await);
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_observer_sees_creations() {
        #[derive(Clone, Default)]
        struct Recorder {
            created: Arc<StdMutex<Vec<String>>>,
        }

        impl SessionObserver for Recorder {
            fn on_created(&self, session_id: &str) {
                self.created.lock().unwrap().push(session_id.to_string());
            }
        }

        let recorder = Recorder::default();
        let store = SessionStore::with_parts(StoreConfig::new(), UuidSource, recorder.clone());

        let id = store.create_session().await.unwrap();

        assert_eq!(*recorder.created.lock().unwrap(), vec![id]);
        store.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent() {
        let store = SessionStore::new(StoreConfig::new());
        store.shutdown().await;
        store.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_evicts_after_shutdown() {
        let store = SessionStore::new(StoreConfig::new());
        let id = store.create_session().await.unwrap();

        store.shutdown().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(store.get_session_data(&id).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_yield_distinct_ids() {
        let store = SessionStore::new(StoreConfig::new());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..1000 {
            let store = store.clone();
            tasks.spawn(async move { store.create_session().await.unwrap() });
        }

        let mut ids = HashSet::new();
        while let Some(id) = tasks.join_next().await {
            ids.insert(id.unwrap());
        }

        assert_eq!(ids.len(), 1000);
        for id in &ids {
            assert!(store.get_session_data(id).await.unwrap().is_empty());
        }
        store.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_alongside_sweeper() {
        // Sweep as fast as possible so passes interleave with the writers;
        // the timeout is long enough that nothing expires mid-test.
        let config = StoreConfig::new()
            .with_idle_timeout(Duration::from_secs(30))
            .with_sweep_interval(Duration::from_millis(1));
        let store = SessionStore::new(config);

        let mut tasks = tokio::task::JoinSet::new();
        for writer in 0..100 {
            let store = store.clone();
            tasks.spawn(async move {
                let id = store.create_session().await.unwrap();
                for round in 0..20 {
                    let mut data = Payload::new();
                    data.insert("writer".to_string(), json!(writer));
                    data.insert("round".to_string(), json!(round));
                    store.update_session_data(&id, data.clone()).await.unwrap();
                    assert_eq!(store.get_session_data(&id).await.unwrap(), data);
                }
            });
        }

        let mut finished = 0;
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
            finished += 1;
        }

        assert_eq!(finished, 100);
        assert_eq!(store.len().await, 100);
        store.shutdown().await;
    }
}
