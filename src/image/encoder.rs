use super::mime;
use crate::{Error, Result};
use base64::Engine as _;
use image::ImageFormat;
use std::path::Path;
use std::sync::Arc;

/// Binary image as handed over by file selection.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    bytes: Arc<[u8]>,
    mime_type: String,
    name: Option<String>,
}

impl ImageBlob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read an image from disk, sniffing its MIME type from the content and
    /// falling back to the file extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;

        let mime_type = mime::detect_image_mime(&bytes)
            .or_else(|| {
                ImageFormat::from_path(path)
                    .ok()
                    .map(|format| format.to_mime_type())
            })
            .filter(|mime_type| mime::is_image_mime(mime_type))
            .ok_or_else(|| {
                Error::Encoding(format!("Unrecognized image type: {}", path.display()))
            })?;

        let blob = Self::new(bytes, mime_type);
        Ok(match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => blob.with_name(name),
            None => blob,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Transport-safe form of an attached image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    /// Standard base64 of the full byte stream.
    pub payload: String,
    /// `data:` URL of the same bytes, displayable without a round trip.
    pub preview_reference: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageEncoder;

impl ImageEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode a blob. Does not decode pixels or enforce size limits.
    pub async fn encode(&self, blob: &ImageBlob) -> Result<EncodedImage> {
        if !mime::is_image_mime(blob.mime_type()) {
            return Err(Error::Encoding(format!(
                "Unsupported MIME type '{}' (expected image/*)",
                blob.mime_type()
            )));
        }

        if blob.is_empty() {
            return Err(Error::Encoding("Image contains no data".to_string()));
        }

        let mime_type = blob.mime_type().trim().to_ascii_lowercase();
        let bytes = Arc::clone(&blob.bytes);

        tracing::debug!("Encoding {} image ({} bytes)", mime_type, bytes.len());

        let payload = tokio::task::spawn_blocking(move || {
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Image encoding task join error: {}", e)))?;

        let preview_reference = format!("data:{};base64,{}", mime_type, payload);

        Ok(EncodedImage {
            mime_type,
            payload,
            preview_reference,
        })
    }
}
