//! Result of one synchronization run

use serde::Serialize;

use crate::models::Record;
use crate::state::SyncState;

/// Which terminal path a synchronization run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Remote unreachable; cached records returned untouched
    Offline,
    /// Remote fetch failed; cached records returned with an error message
    Degraded,
    /// Remote reported zero rows; the cache was emptied
    Cleared,
    /// Merge completed and was persisted
    Synced,
}

/// Records to display after a synchronization run, plus what changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub records: Vec<Record>,
    /// Record count after the run minus the count loaded from cache
    pub delta: i64,
    /// Remote failure message when the run degraded to cached data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: SyncStatus,
    /// Remote rows rejected by schema validation
    pub rejected_rows: usize,
}

impl SyncOutcome {
    pub(crate) const fn offline(records: Vec<Record>) -> Self {
        Self {
            records,
            delta: 0,
            error: None,
            status: SyncStatus::Offline,
            rejected_rows: 0,
        }
    }

    pub(crate) const fn degraded(records: Vec<Record>, error: String) -> Self {
        Self {
            records,
            delta: 0,
            error: Some(error),
            status: SyncStatus::Degraded,
            rejected_rows: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SyncState {
        match self.status {
            SyncStatus::Offline => SyncState::Offline,
            SyncStatus::Degraded => SyncState::Error,
            SyncStatus::Cleared | SyncStatus::Synced => SyncState::Synced,
        }
    }
}
