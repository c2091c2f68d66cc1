//! Shared fixtures and fakes for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::db::{KeyValueStore, MemoryKeyValueStore};
use crate::error::{Error, Result};
use crate::models::{NewRemoteRecord, Origin, Record, RemoteRecord, RemoteSnapshot};
use crate::remote::{ConnectivityProbe, RemoteRecordSink, RemoteRecordSource};

pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

pub fn local_record(id: &str, created_at: DateTime<Utc>) -> Record {
    Record {
        id: id.to_string(),
        title: format!("Local {id}"),
        description: "Pasos locales".to_string(),
        images: Vec::new(),
        created_at,
        updated_at: created_at,
        created_by: None,
        origin: Origin::Local,
    }
}

pub fn remote_record_at(id: &str, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Record {
    remote_row(id, created_at, updated_at).into_record()
}

pub fn remote_row(id: &str, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> RemoteRecord {
    RemoteRecord {
        id: id.to_string(),
        title: format!("Remote {id} @ {}", updated_at.timestamp()),
        description: "Pasos remotos".to_string(),
        images: Vec::new(),
        created_at,
        updated_at,
        created_by: Some("user-1".to_string()),
    }
}

/// A store whose every operation fails.
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Database("storage unavailable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Database("storage unavailable".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(Error::Database("storage unavailable".to_string()))
    }
}

/// Memory store that counts writes.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: MemoryKeyValueStore,
    writes: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: MemoryKeyValueStore) -> Self {
        Self {
            inner,
            writes: Arc::default(),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reset_writes(&self) {
        self.writes.store(0, Ordering::SeqCst);
    }
}

impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key).await
    }
}

#[derive(Default)]
struct FakeRemoteState {
    reachable: bool,
    fetch_error: Option<String>,
    write_error: Option<String>,
    rows: Vec<RemoteRecord>,
    rejected: usize,
    inserted: Vec<NewRemoteRecord>,
    deleted: Vec<Vec<String>>,
    fetch_delay: Option<Duration>,
}

/// In-process stand-in for the remote store.
///
/// Clones share state, so one handle can be given to the synchronizer as
/// both probe and source while the test keeps another for assertions.
#[derive(Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<FakeRemoteState>>,
    fetch_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeRemote {
    pub fn online(rows: Vec<RemoteRecord>) -> Self {
        Self::online_snapshot(RemoteSnapshot::new(rows))
    }

    pub fn online_snapshot(snapshot: RemoteSnapshot) -> Self {
        let remote = Self::default();
        {
            let mut state = remote.state.lock().unwrap();
            state.reachable = true;
            state.rows = snapshot.records;
            state.rejected = snapshot.rejected;
        }
        remote
    }

    pub fn offline() -> Self {
        Self::default()
    }

    /// Reachable, but every fetch fails with `message`.
    pub fn failing(message: &str) -> Self {
        let remote = Self::online(Vec::new());
        remote.state.lock().unwrap().fetch_error = Some(message.to_string());
        remote
    }

    pub fn with_fetch_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().fetch_delay = Some(delay);
        self
    }

    pub fn with_write_error(self, message: &str) -> Self {
        self.state.lock().unwrap().write_error = Some(message.to_string());
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn inserted(&self) -> Vec<NewRemoteRecord> {
        self.state.lock().unwrap().inserted.clone()
    }

    pub fn deleted(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn rows(&self) -> Vec<RemoteRecord> {
        self.state.lock().unwrap().rows.clone()
    }
}

impl ConnectivityProbe for FakeRemote {
    async fn is_reachable(&self) -> bool {
        self.state.lock().unwrap().reachable
    }
}

impl RemoteRecordSource for FakeRemote {
    async fn fetch_all(&self) -> Result<RemoteSnapshot> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let delay = self.state.lock().unwrap().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let state = self.state.lock().unwrap();
            state.fetch_error.as_ref().map_or_else(
                || {
                    Ok(RemoteSnapshot {
                        records: state.rows.clone(),
                        rejected: state.rejected,
                    })
                },
                |message| Err(Error::RemoteFetch(message.clone())),
            )
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl RemoteRecordSink for FakeRemote {
    async fn insert(&self, record: &NewRemoteRecord) -> Result<RemoteRecord> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.write_error {
            return Err(Error::RemoteWrite(message.clone()));
        }

        let now = Utc::now();
        let stored = RemoteRecord {
            id: format!("remote-{}", state.inserted.len() + 1),
            title: record.title.clone(),
            description: record.description.clone(),
            images: record.images.clone(),
            created_at: now,
            updated_at: now,
            created_by: record.created_by.clone(),
        };
        state.inserted.push(record.clone());
        state.rows.insert(0, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.write_error {
            return Err(Error::RemoteWrite(message.clone()));
        }

        state.deleted.push(ids.to_vec());
        let before = state.rows.len();
        state.rows.retain(|row| !ids.contains(&row.id));
        Ok(before - state.rows.len())
    }
}
