//! Image files to inline attachments.

use std::path::Path;

use base64::Engine;

use crate::error::{Error, Result};
use crate::models::{ImageAttachment, MAX_UPLOAD_BATCH_BYTES};

/// MIME type for a supported image extension.
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Read an image file into a Base64 `data:` URL attachment.
pub fn load_image_attachment(path: &Path) -> Result<ImageAttachment> {
    let mime_type = mime_type_for_path(path).ok_or_else(|| {
        Error::InvalidInput(format!("Unsupported image type: {}", path.display()))
    })?;
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("imagen")
        .to_string();

    let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);
    let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    tracing::debug!("Encoded {} ({} bytes)", name, size);
    Ok(ImageAttachment::encoded(
        name,
        format!("data:{mime_type};base64,{payload}"),
        size,
    ))
}

/// Reject image sets whose aggregate size exceeds the upload ceiling.
pub fn ensure_within_upload_limit(images: &[ImageAttachment]) -> Result<()> {
    let total = images
        .iter()
        .fold(0u64, |total, image| total.saturating_add(image.size));
    if total > MAX_UPLOAD_BATCH_BYTES {
        return Err(Error::InvalidInput(format!(
            "Images total {total} bytes; the limit is {MAX_UPLOAD_BATCH_BYTES} bytes"
        )));
    }
    Ok(())
}
