//! Persistent record cache on top of a key-value store.
//!
//! Every operation here is fail-soft: storage and decoding failures are
//! logged and turned into an empty collection, the default timestamp, or a
//! no-op. The offline path depends on the cache never erroring.

use chrono::{DateTime, Utc};

use crate::db::KeyValueStore;
use crate::models::Record;

/// Key holding the JSON array of cached records.
pub const RECORDS_KEY: &str = "@procesos_cache";
/// Key holding the RFC 3339 instant of the last successful sync.
pub const LAST_SYNC_KEY: &str = "@ultimo_sync";
/// Reported when no sync has ever completed.
pub const DEFAULT_LAST_SYNC: &str = "2024-01-01T00:00:00Z";

/// Record collection and last-sync timestamp persisted in a `KeyValueStore`.
#[derive(Clone)]
pub struct RecordCache<S> {
    store: S,
}

impl<S: KeyValueStore> RecordCache<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Previously saved records, or an empty collection.
    pub async fn load(&self) -> Vec<Record> {
        let raw = match self.store.get(RECORDS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                tracing::warn!("Failed to read record cache: {}", error);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Record>>(&raw) {
            Ok(records) => {
                tracing::debug!("Loaded {} records from cache", records.len());
                records
            }
            Err(error) => {
                tracing::warn!("Discarding unreadable record cache: {}", error);
                Vec::new()
            }
        }
    }

    /// Overwrite the cached collection.
    pub async fn save(&self, records: &[Record]) {
        let serialized = match serde_json::to_string(records) {
            Ok(serialized) => serialized,
            Err(error) => {
                tracing::warn!("Failed to serialize record cache: {}", error);
                return;
            }
        };

        match self.store.set(RECORDS_KEY, &serialized).await {
            Ok(()) => tracing::debug!("Saved {} records to cache", records.len()),
            Err(error) => tracing::warn!("Failed to write record cache: {}", error),
        }
    }

    /// Instant of the last successful sync, or `DEFAULT_LAST_SYNC`.
    pub async fn last_sync_timestamp(&self) -> DateTime<Utc> {
        let stored = match self.store.get(LAST_SYNC_KEY).await {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!("Failed to read last sync timestamp: {}", error);
                None
            }
        };

        stored
            .and_then(|raw| match DateTime::parse_from_rfc3339(raw.trim()) {
                Ok(parsed) => Some(parsed.with_timezone(&Utc)),
                Err(error) => {
                    tracing::warn!("Ignoring malformed last sync timestamp {:?}: {}", raw, error);
                    None
                }
            })
            .unwrap_or_else(default_last_sync)
    }

    pub async fn set_last_sync_timestamp(&self, timestamp: DateTime<Utc>) {
        if let Err(error) = self
            .store
            .set(LAST_SYNC_KEY, &timestamp.to_rfc3339())
            .await
        {
            tracing::warn!("Failed to write last sync timestamp: {}", error);
        }
    }
}

/// `DEFAULT_LAST_SYNC` as an instant.
pub fn default_last_sync() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(DEFAULT_LAST_SYNC)
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
