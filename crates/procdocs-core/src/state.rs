//! Shared client state types.

use serde::{Deserialize, Serialize};

/// Coarse sync indicator shown by clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Offline,
    Synced,
    Error,
}

impl SyncState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}
