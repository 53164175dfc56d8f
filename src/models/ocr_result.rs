use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw engine output for one recognition call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Mean confidence (0-100) when the engine reports one
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }
}

/// Final result of an extraction job
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExtractedText {
    pub job_id: u64,
    /// Text shown to the user (trimmed, normalized when enabled)
    pub text: String,
    pub raw_text: String,
    pub confidence: Option<f32>,
    pub preprocessed: bool,
    pub normalized: bool,
    pub engine: String,
    pub finished_at: DateTime<Utc>,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
