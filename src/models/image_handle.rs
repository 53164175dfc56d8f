use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use crate::error::ExtractionError;

/// Where an image handle came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageOrigin {
    /// User-selected file
    Upload { path: PathBuf },
    /// Output of the preprocessing step
    Preprocessed,
    /// Bytes handed over directly (tests, stdin)
    Memory,
}

/// Opaque reference to encoded image bytes.
///
/// Cloning is cheap; the bytes are shared. A handle is superseded, never
/// mutated, when a new image is selected or preprocessing produces a new one.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    bytes: Arc<[u8]>,
    format: ImageFormat,
    width: u32,
    height: u32,
    origin: ImageOrigin,
}

impl ImageHandle {
    /// Wrap already-validated encoded bytes
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        format: ImageFormat,
        width: u32,
        height: u32,
        origin: ImageOrigin,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            format,
            width,
            height,
            origin,
        }
    }

    /// Encode a decoded image as PNG and wrap it
    pub fn from_image(image: &DynamicImage, origin: ImageOrigin) -> Result<Self, ExtractionError> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| ExtractionError::Decode(format!("failed to encode image: {}", e)))?;

        Ok(Self::new(buffer, ImageFormat::Png, image.width(), image.height(), origin))
    }

    /// Decode the full image
    pub fn decode(&self) -> Result<DynamicImage, ExtractionError> {
        image::load_from_memory_with_format(&self.bytes, self.format)
            .map_err(|e| ExtractionError::Decode(e.to_string()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    /// MIME type of the encoded bytes
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}
