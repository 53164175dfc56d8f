use serde::{Deserialize, Serialize};

/// Status label attached to an engine progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionStatus {
    #[serde(rename = "loading engine")]
    LoadingEngine,
    #[serde(rename = "initializing api")]
    InitializingApi,
    #[serde(rename = "recognizing text")]
    RecognizingText,
    /// Any other engine-specific status; ignored by the controller
    #[serde(untagged)]
    Other(String),
}

/// One progress notification from a recognition job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionProgress {
    pub status: RecognitionStatus,
    /// Fraction complete, nominally in [0, 1]
    pub fraction: f32,
}

impl RecognitionProgress {
    pub fn new(status: RecognitionStatus, fraction: f32) -> Self {
        Self { status, fraction }
    }

    pub fn recognizing(fraction: f32) -> Self {
        Self::new(RecognitionStatus::RecognizingText, fraction)
    }

    /// Whole percentage in [0, 100]; NaN maps to 0
    pub fn percent(&self) -> u8 {
        if self.fraction.is_nan() {
            return 0;
        }
        (self.fraction * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Receives progress notifications while an engine runs
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: RecognitionProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(RecognitionProgress) + Send + Sync,
{
    fn on_progress(&self, progress: RecognitionProgress) {
        self(progress)
    }
}

/// Sink that drops every notification
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _progress: RecognitionProgress) {}
}
