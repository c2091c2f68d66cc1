//! Image attachment model

use serde::{Deserialize, Serialize};

/// Aggregate upload ceiling for the images of one new record (1 MiB).
pub const MAX_UPLOAD_BATCH_BYTES: u64 = 1024 * 1024;

/// An image shown alongside a process record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// Display name
    #[serde(rename = "nombre")]
    pub name: String,
    /// Bundled asset identifier when `is_local`, Base64 payload otherwise
    pub data: String,
    /// Selects how `data` is interpreted
    #[serde(rename = "isLocal", default)]
    pub is_local: bool,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Borrowed view of where an attachment's pixels come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// Asset shipped with the client, addressed by identifier
    Bundled(&'a str),
    /// Base64 payload (optionally a `data:` URL) delivered by the remote store
    Encoded(&'a str),
}

impl ImageAttachment {
    #[must_use]
    pub fn bundled(name: impl Into<String>, asset_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: asset_id.into(),
            is_local: true,
            size: 0,
        }
    }

    #[must_use]
    pub fn encoded(name: impl Into<String>, payload: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            data: payload.into(),
            is_local: false,
            size,
        }
    }

    #[must_use]
    pub fn source(&self) -> ImageSource<'_> {
        if self.is_local {
            ImageSource::Bundled(&self.data)
        } else {
            ImageSource::Encoded(&self.data)
        }
    }

    /// Copy of this attachment as delivered by the remote store.
    #[must_use]
    pub fn into_remote(self) -> Self {
        Self {
            is_local: false,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_follows_flag() {
        let bundled = ImageAttachment::bundled("prensa", "prensa_01");
        assert_eq!(bundled.source(), ImageSource::Bundled("prensa_01"));

        let encoded = ImageAttachment::encoded("foto", "data:image/png;base64,AAAA", 3);
        assert_eq!(
            encoded.source(),
            ImageSource::Encoded("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn test_into_remote_clears_local_flag() {
        let image = ImageAttachment::bundled("prensa", "prensa_01").into_remote();
        assert!(!image.is_local);
        assert_eq!(image.data, "prensa_01");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let image: ImageAttachment =
            serde_json::from_str(r#"{"nombre": "a", "data": "QUJD"}"#).unwrap();
        assert!(!image.is_local);
        assert_eq!(image.size, 0);
    }
}
