//! Remote record store interfaces and their Supabase implementation

mod client;
mod records;

pub use client::SupabaseClient;

use crate::error::Result;
use crate::models::{NewRemoteRecord, RemoteRecord, RemoteSnapshot};

/// Cheap reachability check against the remote store.
#[allow(async_fn_in_trait)]
pub trait ConnectivityProbe {
    /// True only if a minimal remote read succeeded
    async fn is_reachable(&self) -> bool;
}

/// Read side of the remote store.
#[allow(async_fn_in_trait)]
pub trait RemoteRecordSource {
    /// Every remote record, newest `created_at` first
    async fn fetch_all(&self) -> Result<RemoteSnapshot>;
}

/// Write side of the remote store.
#[allow(async_fn_in_trait)]
pub trait RemoteRecordSink {
    /// Insert one record and return the stored row
    async fn insert(&self, record: &NewRemoteRecord) -> Result<RemoteRecord>;

    /// Delete records by id, returning how many rows were removed
    async fn delete(&self, ids: &[String]) -> Result<usize>;
}
