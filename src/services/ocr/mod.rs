pub mod engine;
pub mod http_ocr;
pub mod preprocessing;
#[cfg(feature = "tesseract")]
pub mod tesseract;

// Re-export main types
pub use engine::{EngineService, OcrEngine, PageSegMode, RecognitionOptions};
pub use http_ocr::HttpOcrEngine;
pub use preprocessing::PreprocessingService;
#[cfg(feature = "tesseract")]
pub use self::tesseract::TesseractEngine;
