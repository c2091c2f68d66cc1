//! Process record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::image::ImageAttachment;

/// Prefix of ids generated on-device before the remote store assigns one.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Provenance of a cached record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Created on this device; never overwritten by remote data
    #[serde(rename = "local")]
    Local,
    /// Confirmed by the remote store; replaced by newer remote versions
    #[serde(rename = "remoto")]
    Remote,
}

impl Origin {
    /// Same spelling as the serialized `origen` value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remoto",
        }
    }
}

/// A process documentation entry as held in the local cache.
///
/// Field names on the wire follow the remote table columns so a cache
/// snapshot written by the mobile client can be read back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the remote store (or `local-<uuid>` before first sync)
    pub id: String,
    /// Human-readable title, also the lookup key for voice commands
    #[serde(rename = "titulo")]
    pub title: String,
    /// Free text read aloud to the operator
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Images in display order
    #[serde(rename = "imagenes", default)]
    pub images: Vec<ImageAttachment>,
    /// Creation instant, immutable
    pub created_at: DateTime<Utc>,
    /// Last remote mutation instant, the only conflict-resolution signal
    pub updated_at: DateTime<Utc>,
    /// Authenticated user that created the record
    #[serde(default)]
    pub created_by: Option<String>,
    /// Provenance tag
    #[serde(rename = "origen")]
    pub origin: Origin,
}

impl Record {
    /// Create a device-local record with a generated id.
    #[must_use]
    pub fn new_local(
        title: impl Into<String>,
        description: impl Into<String>,
        images: Vec<ImageAttachment>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{LOCAL_ID_PREFIX}{}", Uuid::now_v7()),
            title: title.into(),
            description: description.into(),
            images,
            created_at: now,
            updated_at: now,
            created_by: None,
            origin: Origin::Local,
        }
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self.origin, Origin::Local)
    }

    /// Case-insensitive substring match against the title.
    #[must_use]
    pub fn matches_title(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        !query.is_empty() && self.title.to_lowercase().contains(&query)
    }

    /// Aggregate byte size of every attached image.
    #[must_use]
    pub fn total_image_size(&self) -> u64 {
        self.images.iter().map(|image| image.size).sum()
    }
}
