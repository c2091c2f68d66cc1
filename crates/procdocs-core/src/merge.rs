//! Reconciliation of cached records with a remote snapshot.
//!
//! # Algorithm
//!
//! 1. Seed an id-keyed table with every cached record, unmodified
//! 2. Walk the remote records:
//!    - unknown id: insert as `REMOTE`, images forced non-local
//!    - known `REMOTE` entry: replace only if the remote `updated_at` is
//!      strictly later
//!    - known `LOCAL` entry: never touched
//! 3. Stable-sort by `created_at` ascending
//!
//! The function is pure and total. Equal timestamps keep the cached entry.

use std::collections::HashMap;

use crate::models::{Origin, Record, RemoteRecord};

/// What a merge did, for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Remote records whose id was not cached
    pub inserted: usize,
    /// Cached `REMOTE` entries replaced by a newer remote version
    pub replaced: usize,
    /// Remote records ignored because the cached entry was as new or newer
    pub unchanged: usize,
    /// Remote records ignored because the cached entry is `LOCAL`
    pub protected: usize,
}

impl MergeReport {
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.inserted > 0 || self.replaced > 0
    }
}

/// Merge cached records with remote records.
#[must_use]
pub fn merge(local: Vec<Record>, remote: Vec<RemoteRecord>) -> Vec<Record> {
    merge_with_report(local, remote).0
}

/// `merge`, also reporting how each remote record was handled.
#[must_use]
pub fn merge_with_report(
    local: Vec<Record>,
    remote: Vec<RemoteRecord>,
) -> (Vec<Record>, MergeReport) {
    let mut merged: Vec<Record> = Vec::with_capacity(local.len() + remote.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(local.len() + remote.len());
    let mut report = MergeReport::default();

    for record in local {
        // Records without an id cannot be matched; carry them through as-is
        if record.id.is_empty() {
            merged.push(record);
            continue;
        }
        match index.get(&record.id) {
            Some(&slot) => merged[slot] = record,
            None => {
                index.insert(record.id.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    for incoming in remote {
        match index.get(&incoming.id) {
            None => {
                index.insert(incoming.id.clone(), merged.len());
                merged.push(incoming.into_record());
                report.inserted += 1;
            }
            Some(&slot) => {
                let existing = &merged[slot];
                match existing.origin {
                    Origin::Local => report.protected += 1,
                    Origin::Remote if incoming.updated_at > existing.updated_at => {
                        tracing::debug!("Remote record updated: {}", incoming.title);
                        merged[slot] = incoming.into_record();
                        report.replaced += 1;
                    }
                    Origin::Remote => report.unchanged += 1,
                }
            }
        }
    }

    merged.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    (merged, report)
}
