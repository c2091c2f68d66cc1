//! procdocs-core - Core library for procdocs
//!
//! Offline-first access to factory process documentation ("procesos") stored
//! in a Supabase table: the local record cache, the remote client, the merge
//! engine and the synchronizer that ties them together.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod merge;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use models::{ImageAttachment, Origin, Record, RemoteRecord};
pub use sync::{SyncOutcome, SyncStatus, Synchronizer};
