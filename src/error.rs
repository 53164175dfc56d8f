use serde::Serialize;
use thiserror::Error;

/// Errors that terminate an extraction job.
///
/// Every variant is caught at the pipeline controller boundary; callers see
/// them only inside [`crate::services::pipeline::JobOutcome::Failed`] and in
/// the published pipeline state.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExtractionError {
    /// Image bytes could not be read, decoded or re-encoded
    #[error("image could not be decoded: {0}")]
    Decode(String),

    /// OCR engine failure, including timeouts and unsupported input
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Engine initialization has not completed (or failed)
    #[error("OCR engine is not ready: {0}")]
    EngineNotReady(String),

    #[error("image exceeds input limits: {reason}")]
    InputTooLarge { reason: String },

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl ExtractionError {
    /// Short machine-friendly name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Recognition(_) => "recognition",
            Self::EngineNotReady(_) => "engine_not_ready",
            Self::InputTooLarge { .. } => "input_too_large",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Io(_) => "io",
        }
    }

    /// Message shown to the user in place of a silent failure
    pub fn user_message(&self) -> String {
        match self {
            Self::Decode(detail) => format!(
                "The selected file could not be read as an image ({}). Try another file.",
                detail
            ),
            Self::Recognition(detail) => format!(
                "Text recognition failed ({}). Try a clearer image or enable preprocessing.",
                detail
            ),
            Self::EngineNotReady(detail) => format!(
                "The OCR engine is still starting or unavailable ({}). Try again shortly.",
                detail
            ),
            Self::InputTooLarge { reason } => {
                format!("The image is too large to process: {}.", reason)
            }
            Self::UnsupportedFormat(detail) => {
                format!("Only image files are supported ({}).", detail)
            }
            Self::Io(detail) => format!("The file could not be opened ({}).", detail),
        }
    }
}

impl From<std::io::Error> for ExtractionError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<image::ImageError> for ExtractionError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Unsupported(inner) => Self::UnsupportedFormat(inner.to_string()),
            image::ImageError::IoError(inner) => Self::Io(inner.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

/// Errors from configuration persistence
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    NoConfigDir,

    #[error("config I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from platform capabilities (clipboard, link opener)
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("no {capability} tool available on this system (tried: {tried})")]
    Unavailable { capability: &'static str, tried: String },

    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },
}
