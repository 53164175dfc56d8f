pub mod commands;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use error::{CapabilityError, ConfigError, ExtractionError};
pub use models::config::AppConfig;
pub use models::image_handle::{ImageHandle, ImageOrigin};
pub use models::ocr_result::{ExtractedText, RecognizedText};
pub use models::progress::{ProgressSink, RecognitionProgress, RecognitionStatus};
pub use services::ocr::{EngineService, OcrEngine, PageSegMode, RecognitionOptions};
pub use services::pipeline::{JobOutcome, PipelineController, PipelineSettings, PipelineState};
