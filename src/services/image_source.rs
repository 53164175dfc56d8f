use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use crate::error::ExtractionError;
use crate::models::config::InputLimits;
use crate::models::image_handle::{ImageHandle, ImageOrigin};

/// Turns user-selected files into image handles, enforcing input limits
#[derive(Debug, Clone)]
pub struct ImageSource {
    limits: InputLimits,
}

impl ImageSource {
    pub fn new(limits: InputLimits) -> Self {
        Self { limits }
    }

    /// Load a file selected by the user
    pub fn load(&self, path: &Path) -> Result<ImageHandle, ExtractionError> {
        let size = std::fs::metadata(path)?.len();
        self.check_size(size)?;

        let bytes = std::fs::read(path)?;
        self.load_bytes(bytes, ImageOrigin::Upload { path: path.to_path_buf() })
    }

    /// Validate in-memory bytes and wrap them
    pub fn load_bytes(
        &self,
        bytes: Vec<u8>,
        origin: ImageOrigin,
    ) -> Result<ImageHandle, ExtractionError> {
        self.check_size(bytes.len() as u64)?;

        let format = image::guess_format(&bytes).map_err(|_| {
            ExtractionError::UnsupportedFormat(match &origin {
                ImageOrigin::Upload { path } => {
                    format!("{} is not a recognized image", path.display())
                }
                _ => "data is not a recognized image".to_string(),
            })
        })?;

        let (width, height) = Self::read_dimensions(&bytes, format)?;
        self.check_dimensions(width, height)?;

        tracing::debug!(?format, width, height, bytes = bytes.len(), "Image selected");
        Ok(ImageHandle::new(bytes, format, width, height, origin))
    }

    /// Header-only dimension read; full decode happens later
    fn read_dimensions(bytes: &[u8], format: ImageFormat) -> Result<(u32, u32), ExtractionError> {
        let mut reader = ImageReader::new(Cursor::new(bytes));
        reader.set_format(format);
        reader
            .into_dimensions()
            .map_err(|e| ExtractionError::Decode(format!("could not read image header: {}", e)))
    }

    fn check_size(&self, size: u64) -> Result<(), ExtractionError> {
        if size > self.limits.max_bytes {
            return Err(ExtractionError::InputTooLarge {
                reason: format!("{} bytes exceeds the {} byte limit", size, self.limits.max_bytes),
            });
        }
        Ok(())
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<(), ExtractionError> {
        let max = self.limits.max_dimension;
        if width > max || height > max {
            return Err(ExtractionError::InputTooLarge {
                reason: format!("{}x{} exceeds {} px on a side", width, height, max),
            });
        }
        if width == 0 || height == 0 {
            return Err(ExtractionError::Decode(format!(
                "image has empty dimensions {}x{}",
                width, height
            )));
        }
        Ok(())
    }
}

impl Default for ImageSource {
    fn default() -> Self {
        Self::new(InputLimits::default())
    }
}
