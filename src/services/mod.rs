pub mod config;
pub mod image_source;
pub mod normalizer;
pub mod ocr;
pub mod pipeline;
pub mod share;
