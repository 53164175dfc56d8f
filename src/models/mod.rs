pub mod config;
pub mod image_handle;
pub mod ocr_result;
pub mod progress;
