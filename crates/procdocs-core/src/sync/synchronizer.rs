//! Cache-first synchronization against the remote record store.
//!
//! One run walks a fixed sequence: load cache, probe, fetch, merge, persist.
//! Every failure after the cache load degrades to returning cached records;
//! nothing here surfaces as an `Err` to the caller.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::outcome::{SyncOutcome, SyncStatus};
use crate::cache::RecordCache;
use crate::config::EmptyRemotePolicy;
use crate::db::KeyValueStore;
use crate::merge::merge_with_report;
use crate::models::Record;
use crate::remote::{ConnectivityProbe, RemoteRecordSource};
use crate::util::count_delta;

/// Reconciles the local record cache with the remote store.
pub struct Synchronizer<S, R, P> {
    cache: RecordCache<S>,
    source: R,
    probe: P,
    empty_remote_policy: EmptyRemotePolicy,
    // Held for a whole run so overlapping calls cannot interleave cache load/save
    run_lock: Mutex<()>,
}

impl<S, R, P> Synchronizer<S, R, P>
where
    S: KeyValueStore,
    R: RemoteRecordSource,
    P: ConnectivityProbe,
{
    pub fn new(cache: RecordCache<S>, source: R, probe: P) -> Self {
        Self {
            cache,
            source,
            probe,
            empty_remote_policy: EmptyRemotePolicy::default(),
            run_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_empty_remote_policy(mut self, policy: EmptyRemotePolicy) -> Self {
        self.empty_remote_policy = policy;
        self
    }

    pub const fn cache(&self) -> &RecordCache<S> {
        &self.cache
    }

    pub const fn source(&self) -> &R {
        &self.source
    }

    /// Cached records for immediate display, without touching the network.
    pub async fn cached_records(&self) -> Vec<Record> {
        let _guard = self.run_lock.lock().await;
        self.cache.load().await
    }

    pub async fn last_synced_at(&self) -> DateTime<Utc> {
        self.cache.last_sync_timestamp().await
    }

    /// Run one synchronization. Concurrent calls are serialized.
    pub async fn synchronize(&self) -> SyncOutcome {
        let _guard = self.run_lock.lock().await;

        let cached = self.cache.load().await;
        tracing::debug!("Sync started with {} cached records", cached.len());

        if !self.probe.is_reachable().await {
            tracing::info!("Remote unreachable; using {} cached records", cached.len());
            return SyncOutcome::offline(cached);
        }

        let snapshot = match self.source.fetch_all().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!("Remote fetch failed; keeping cached records: {}", error);
                return SyncOutcome::degraded(cached, error.to_string());
            }
        };
        let rejected_rows = snapshot.rejected;

        if snapshot.is_empty() && self.empty_remote_policy == EmptyRemotePolicy::Wipe {
            tracing::info!(
                "Remote has no records; clearing {} cached records",
                cached.len()
            );
            self.cache.save(&[]).await;
            return SyncOutcome {
                records: Vec::new(),
                delta: count_delta(0, cached.len()),
                error: None,
                status: SyncStatus::Cleared,
                rejected_rows,
            };
        }

        let cached_count = cached.len();
        let (merged, report) = merge_with_report(cached, snapshot.records);
        if report.changed() {
            tracing::info!(
                "Merged {} records ({} new, {} updated, {} local kept, {} quarantined)",
                merged.len(),
                report.inserted,
                report.replaced,
                report.protected,
                rejected_rows
            );
        } else {
            tracing::debug!(
                "Cache already current with {} records ({} quarantined)",
                merged.len(),
                rejected_rows
            );
        }

        self.cache.save(&merged).await;
        self.cache.set_last_sync_timestamp(Utc::now()).await;

        SyncOutcome {
            delta: count_delta(merged.len(), cached_count),
            records: merged,
            error: None,
            status: SyncStatus::Synced,
            rejected_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{default_last_sync, RECORDS_KEY};
    use crate::db::MemoryKeyValueStore;
    use crate::models::{Origin, RemoteSnapshot};
    use crate::testing::{
        local_record, remote_record_at, remote_row, ts, CountingStore, FakeRemote,
    };
    use pretty_assertions::assert_eq;

    async fn cache_with(records: &[Record]) -> RecordCache<CountingStore> {
        let cache = RecordCache::new(CountingStore::new(MemoryKeyValueStore::new()));
        cache.save(records).await;
        cache.store().reset_writes();
        cache
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_returns_cache_without_writing() {
        let cached = vec![local_record("a", ts(1)), remote_record_at("b", ts(2), ts(2))];
        let cache = cache_with(&cached).await;
        let remote = FakeRemote::offline();

        let sync = Synchronizer::new(cache, remote.clone(), remote.clone());
        let outcome = sync.synchronize().await;

        assert_eq!(outcome.status, SyncStatus::Offline);
        assert_eq!(outcome.records, cached);
        assert_eq!(outcome.delta, 0);
        assert_eq!(outcome.error, None);
        assert_eq!(sync.cache().store().writes(), 0);
        assert_eq!(remote.fetch_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_error_degrades_to_cache() {
        let cached = vec![remote_record_at("a", ts(1), ts(1))];
        let cache = cache_with(&cached).await;
        let remote = FakeRemote::failing("connection reset");

        let sync = Synchronizer::new(cache, remote.clone(), remote);
        let outcome = sync.synchronize().await;

        assert_eq!(outcome.status, SyncStatus::Degraded);
        assert_eq!(outcome.records, cached);
        assert_eq!(outcome.delta, 0);
        assert!(outcome
            .error
            .as_deref()
            .is_some_and(|message| message.contains("connection reset")));
        assert_eq!(sync.cache().store().writes(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_remote_wipes_cache() {
        let cached = vec![
            local_record("a", ts(1)),
            remote_record_at("b", ts(2), ts(2)),
            remote_record_at("c", ts(3), ts(3)),
        ];
        let cache = cache_with(&cached).await;
        let remote = FakeRemote::online(Vec::new());

        let sync = Synchronizer::new(cache, remote.clone(), remote);
        let outcome = sync.synchronize().await;

        assert_eq!(outcome.status, SyncStatus::Cleared);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.delta, -3);
        assert_eq!(
            sync.cache().store().get(RECORDS_KEY).await.unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(sync.last_synced_at().await, default_last_sync());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_remote_preserved_under_preserve_policy() {
        let cached = vec![local_record("a", ts(1)), remote_record_at("b", ts(2), ts(2))];
        let cache = cache_with(&cached).await;
        let remote = FakeRemote::online(Vec::new());

        let sync = Synchronizer::new(cache, remote.clone(), remote)
            .with_empty_remote_policy(EmptyRemotePolicy::Preserve);
        let outcome = sync.synchronize().await;

        assert_eq!(outcome.status, SyncStatus::Synced);
        assert_eq!(outcome.records, cached);
        assert_eq!(outcome.delta, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fully_quarantined_snapshot_does_not_wipe() {
        let cached = vec![remote_record_at("a", ts(1), ts(1))];
        let cache = cache_with(&cached).await;
        let remote = FakeRemote::online_snapshot(RemoteSnapshot {
            records: Vec::new(),
            rejected: 2,
        });

        let sync = Synchronizer::new(cache, remote.clone(), remote);
        let outcome = sync.synchronize().await;

        assert_eq!(outcome.status, SyncStatus::Synced);
        assert_eq!(outcome.records, cached);
        assert_eq!(outcome.rejected_rows, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn merge_result_is_persisted_with_timestamp() {
        let cached = vec![local_record("a", ts(0))];
        let cache = cache_with(&cached).await;
        let remote = FakeRemote::online(vec![
            remote_row("b", ts(20), ts(20)),
            remote_row("a", ts(0), ts(10)),
        ]);

        let sync = Synchronizer::new(cache, remote.clone(), remote);
        let before = Utc::now();
        let outcome = sync.synchronize().await;

        assert_eq!(outcome.status, SyncStatus::Synced);
        assert_eq!(outcome.delta, 1);
        assert_eq!(outcome.records[0], cached[0]);
        assert_eq!(outcome.records[1].id, "b");
        assert_eq!(outcome.records[1].origin, Origin::Remote);

        assert_eq!(sync.cached_records().await, outcome.records);
        assert!(sync.last_synced_at().await >= before - chrono::Duration::seconds(1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreadable_cache_is_treated_as_empty() {
        let store = CountingStore::new(MemoryKeyValueStore::new());
        store.set(RECORDS_KEY, "[{\"id\":").await.unwrap();
        let remote = FakeRemote::online(vec![remote_row("a", ts(1), ts(1))]);

        let sync = Synchronizer::new(RecordCache::new(store), remote.clone(), remote);
        let outcome = sync.synchronize().await;

        assert_eq!(outcome.status, SyncStatus::Synced);
        assert_eq!(outcome.delta, 1);
        assert_eq!(outcome.records.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_runs_are_serialized() {
        let cache = cache_with(&[]).await;
        let remote = FakeRemote::online(vec![remote_row("a", ts(1), ts(1))])
            .with_fetch_delay(std::time::Duration::from_millis(20));

        let sync = Synchronizer::new(cache, remote.clone(), remote.clone());
        let (first, second) = tokio::join!(sync.synchronize(), sync.synchronize());

        assert_eq!(remote.fetch_calls(), 2);
        assert_eq!(remote.max_concurrent_fetches(), 1);
        assert_eq!(first.delta + second.delta, 1);
        assert_eq!(sync.cached_records().await.len(), 1);
    }
}
