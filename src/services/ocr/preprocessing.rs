use image::{DynamicImage, GrayImage, Luma};
use crate::error::ExtractionError;
use crate::models::config::PreprocessingConfig;
use crate::models::image_handle::{ImageHandle, ImageOrigin};

/// Image preprocessing service for OCR optimization
#[derive(Debug, Clone)]
pub struct PreprocessingService {
    config: PreprocessingConfig,
}

impl PreprocessingService {
    /// Create a new preprocessing service with custom configuration
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Full preprocessing pipeline: decode → grayscale → threshold → blur → PNG
    pub fn preprocess(&self, handle: &ImageHandle) -> Result<ImageHandle, ExtractionError> {
        let image = handle.decode()?;
        let processed = self.process_image(&image);

        tracing::debug!(
            width = processed.width(),
            height = processed.height(),
            threshold = self.config.threshold,
            blur_kernel = self.config.blur_kernel,
            "Preprocessed image"
        );

        ImageHandle::from_image(&DynamicImage::ImageLuma8(processed), ImageOrigin::Preprocessed)
    }

    /// Pixel pipeline on an already decoded image
    pub fn process_image(&self, image: &DynamicImage) -> GrayImage {
        let gray = Self::to_grayscale(image);
        let binary = Self::threshold(&gray, self.config.threshold);
        Self::blur(&binary, self.config.blur_kernel)
    }

    /// Convert image to single-channel grayscale
    pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
        image.to_luma8()
    }

    /// Binary threshold: pixels strictly above `level` become 255, all others 0
    pub fn threshold(gray: &GrayImage, level: u8) -> GrayImage {
        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] > level {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    /// Box blur with a square `kernel` x `kernel` window (edges replicated)
    pub fn blur(gray: &GrayImage, kernel: u32) -> GrayImage {
        if kernel <= 1 {
            return gray.clone();
        }

        let radius = kernel / 2;
        imageproc::filter::box_filter(gray, radius, radius)
    }
}

impl Default for PreprocessingService {
    fn default() -> Self {
        Self::new(PreprocessingConfig::default())
    }
}
