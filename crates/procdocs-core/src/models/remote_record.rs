//! Rows of the remote `procesos` table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::image::ImageAttachment;
use super::record::{Origin, Record};

/// A record row exactly as the remote table returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "imagenes", default)]
    pub images: Vec<ImageAttachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl RemoteRecord {
    /// Validate one untyped row from the remote query.
    ///
    /// Rows that do not match the schema, or whose id is blank, are rejected
    /// with a message describing why.
    pub fn from_row(row: serde_json::Value) -> Result<Self, String> {
        let record: Self = serde_json::from_value(row).map_err(|error| error.to_string())?;
        if record.id.trim().is_empty() {
            return Err("row has an empty id".to_string());
        }
        Ok(record)
    }

    /// Convert into a cached record tagged `REMOTE` with non-local images.
    #[must_use]
    pub fn into_record(self) -> Record {
        Record {
            id: self.id,
            title: self.title,
            description: self.description,
            images: self
                .images
                .into_iter()
                .map(ImageAttachment::into_remote)
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by,
            origin: Origin::Remote,
        }
    }
}

/// Insert payload for a new remote row; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRemoteRecord {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "imagenes")]
    pub images: Vec<ImageAttachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Validated result of one full remote fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSnapshot {
    /// Rows that passed validation, in the order the remote returned them
    pub records: Vec<RemoteRecord>,
    /// Rows rejected by validation
    pub rejected: usize,
}

impl RemoteSnapshot {
    #[must_use]
    pub const fn new(records: Vec<RemoteRecord>) -> Self {
        Self {
            records,
            rejected: 0,
        }
    }

    /// Validate raw rows, quarantining the ones that fail.
    #[must_use]
    pub fn from_rows(rows: Vec<serde_json::Value>) -> Self {
        let mut snapshot = Self::default();
        for row in rows {
            let row_id = row
                .get("id")
                .map_or_else(|| "<missing>".to_string(), ToString::to_string);
            match RemoteRecord::from_row(row) {
                Ok(record) => snapshot.records.push(record),
                Err(reason) => {
                    tracing::warn!("Quarantined remote row {}: {}", row_id, reason);
                    snapshot.rejected += 1;
                }
            }
        }
        snapshot
    }

    /// True only when the remote returned no rows at all.
    ///
    /// A snapshot whose rows were all quarantined is not empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.rejected == 0
    }
}
