//! Creating and deleting process records against the remote store.

use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use crate::media::ensure_within_upload_limit;
use crate::models::{ImageAttachment, NewRemoteRecord, RemoteRecord};
use crate::remote::{ConnectivityProbe, RemoteRecordSink, RemoteRecordSource};
use crate::sync::{SyncOutcome, Synchronizer};

/// Draft of a record before it is sent to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProcess {
    pub title: String,
    pub description: String,
    pub images: Vec<ImageAttachment>,
}

impl NewProcess {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        images: Vec<ImageAttachment>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            images,
        }
    }

    /// Check the draft and build the insert payload.
    pub fn into_payload(self, created_by: Option<String>) -> Result<NewRemoteRecord> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("Title is required".to_string()));
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(Error::InvalidInput("Description is required".to_string()));
        }
        if self.images.is_empty() {
            return Err(Error::InvalidInput(
                "At least one image is required".to_string(),
            ));
        }
        ensure_within_upload_limit(&self.images)?;

        Ok(NewRemoteRecord {
            title: title.to_string(),
            description: description.to_string(),
            images: self.images,
            created_by,
        })
    }
}

/// A successful insert and the synchronization that followed it.
#[derive(Debug, Clone)]
pub struct CreatedProcess {
    pub record: RemoteRecord,
    pub sync: SyncOutcome,
}

impl CreatedProcess {
    /// Set when the record was stored but the follow-up sync failed.
    pub fn warning(&self) -> Option<&str> {
        self.sync.error.as_deref()
    }
}

/// Remote writes followed by a refresh of the local cache.
pub struct ProcessService<K, S, R, P> {
    sink: K,
    synchronizer: Synchronizer<S, R, P>,
}

impl<K, S, R, P> ProcessService<K, S, R, P>
where
    K: RemoteRecordSink,
    S: KeyValueStore,
    R: RemoteRecordSource,
    P: ConnectivityProbe,
{
    pub const fn new(sink: K, synchronizer: Synchronizer<S, R, P>) -> Self {
        Self { sink, synchronizer }
    }

    pub const fn synchronizer(&self) -> &Synchronizer<S, R, P> {
        &self.synchronizer
    }

    /// Insert a new record remotely, then force a synchronization.
    ///
    /// Insert failures are returned as errors and not retried.
    pub async fn create_process(
        &self,
        draft: NewProcess,
        created_by: Option<String>,
    ) -> Result<CreatedProcess> {
        let payload = draft.into_payload(created_by)?;
        let record = self.sink.insert(&payload).await?;

        let sync = self.synchronizer.synchronize().await;
        if let Some(error) = &sync.error {
            tracing::warn!("Record {} stored but refresh failed: {}", record.id, error);
        }
        Ok(CreatedProcess { record, sync })
    }

    /// Delete records remotely in one batch. The cache is left as is.
    pub async fn delete_processes(&self, ids: &[String]) -> Result<usize> {
        let ids = ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect::<Vec<_>>();
        if ids.is_empty() {
            return Err(Error::InvalidInput(
                "No records selected for deletion".to_string(),
            ));
        }

        self.sink.delete(&ids).await
    }
}
