use serde::{Deserialize, Serialize};
use crate::error::ConfigError;
use crate::services::normalizer::WordCharset;
use crate::services::ocr::engine::PageSegMode;

/// Image preprocessing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub enabled: bool,
    /// Binary threshold level; pixels strictly above it become white
    pub threshold: u8,
    /// Box blur kernel side length (odd, 1 disables)
    pub blur_kernel: u32,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 128,
            blur_kernel: 3,
        }
    }
}

/// OCR engine choice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// OCR HTTP server
    #[default]
    Http,
    /// In-process libtesseract (needs the `tesseract` feature)
    Tesseract,
}

/// Recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    pub engine: EngineKind,
    pub language: String,
    pub page_seg_mode: Option<PageSegMode>,
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub ready_timeout_secs: u64,
    /// Directory holding `*.traineddata` (tesseract engine); `None` uses the library default
    pub tessdata_path: Option<String>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Http,
            language: "eng".to_string(),
            page_seg_mode: None,
            server_url: "http://127.0.0.1:39835".to_string(),
            request_timeout_secs: 30,
            ready_timeout_secs: 30,
            tessdata_path: None,
        }
    }
}

/// Text cleanup configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizationConfig {
    pub enabled: bool,
    pub charset: WordCharset,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            charset: WordCharset::Ascii,
        }
    }
}

/// Input limits applied when an image is selected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputLimits {
    pub max_bytes: u64,
    pub max_dimension: u32,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_bytes: 20 * 1024 * 1024,
            max_dimension: 8000,
        }
    }
}

/// Share action configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShareConfig {
    /// Prefix the URL-encoded text is appended to
    pub base_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wa.me/?text=".to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub limits: InputLimits,
    #[serde(default)]
    pub share: ShareConfig,
}

impl AppConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let kernel = self.preprocessing.blur_kernel;
        if kernel == 0 || kernel % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "blur_kernel must be a positive odd number, got {}",
                kernel
            )));
        }

        if self.recognition.language.trim().is_empty() {
            return Err(ConfigError::Invalid("language must not be empty".to_string()));
        }

        if self.limits.max_bytes == 0 || self.limits.max_dimension == 0 {
            return Err(ConfigError::Invalid("input limits must be non-zero".to_string()));
        }

        if self.recognition.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be non-zero".to_string()));
        }

        Ok(())
    }
}
