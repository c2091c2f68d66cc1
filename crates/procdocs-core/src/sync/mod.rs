//! Offline-first synchronization of the record cache

mod outcome;
mod synchronizer;

pub use outcome::{SyncOutcome, SyncStatus};
pub use synchronizer::Synchronizer;
