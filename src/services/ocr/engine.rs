use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use crate::error::ExtractionError;
use crate::models::image_handle::ImageHandle;
use crate::models::ocr_result::RecognizedText;
use crate::models::progress::ProgressSink;

/// Page layout analysis strategy passed through to the engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageSegMode {
    OsdOnly,
    AutoOsd,
    AutoOnly,
    Auto,
    SingleColumn,
    SingleBlockVertText,
    SingleBlock,
    SingleLine,
    SingleWord,
    CircleWord,
    SingleChar,
    SparseText,
    SparseTextOsd,
    RawLine,
}

impl PageSegMode {
    /// Numeric `--psm` value used by Tesseract
    pub fn as_psm(self) -> u8 {
        match self {
            Self::OsdOnly => 0,
            Self::AutoOsd => 1,
            Self::AutoOnly => 2,
            Self::Auto => 3,
            Self::SingleColumn => 4,
            Self::SingleBlockVertText => 5,
            Self::SingleBlock => 6,
            Self::SingleLine => 7,
            Self::SingleWord => 8,
            Self::CircleWord => 9,
            Self::SingleChar => 10,
            Self::SparseText => 11,
            Self::SparseTextOsd => 12,
            Self::RawLine => 13,
        }
    }

    pub fn from_psm(value: u8) -> Option<Self> {
        let mode = match value {
            0 => Self::OsdOnly,
            1 => Self::AutoOsd,
            2 => Self::AutoOnly,
            3 => Self::Auto,
            4 => Self::SingleColumn,
            5 => Self::SingleBlockVertText,
            6 => Self::SingleBlock,
            7 => Self::SingleLine,
            8 => Self::SingleWord,
            9 => Self::CircleWord,
            10 => Self::SingleChar,
            11 => Self::SparseText,
            12 => Self::SparseTextOsd,
            13 => Self::RawLine,
            _ => return None,
        };
        Some(mode)
    }
}

impl std::str::FromStr for PageSegMode {
    type Err = String;

    /// Accepts either the Tesseract number ("6") or the snake_case name ("single_block")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<u8>() {
            return Self::from_psm(n)
                .ok_or_else(|| format!("Page segmentation mode {} out of range (0-13)", n));
        }

        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("Unknown page segmentation mode: {}", s))
    }
}

/// Options for one recognition call
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOptions {
    pub language: String,
    pub page_seg_mode: Option<PageSegMode>,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_seg_mode: None,
        }
    }
}

/// OCR Engine trait - abstraction for different OCR implementations
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs and reports
    fn name(&self) -> &str;

    /// One-time initialization (model loading, server health check)
    async fn warm_up(&self) -> Result<(), ExtractionError> {
        Ok(())
    }

    /// Recognize text, reporting progress through `progress`
    async fn recognize(
        &self,
        image: &ImageHandle,
        options: &RecognitionOptions,
        progress: &dyn ProgressSink,
    ) -> Result<RecognizedText, ExtractionError>;
}

#[derive(Debug, Clone, PartialEq)]
enum Readiness {
    Pending,
    Ready,
    Failed(String),
}

/// Process-wide engine wrapper that refuses recognition before warm-up completes
pub struct EngineService {
    engine: Arc<dyn OcrEngine>,
    ready_tx: watch::Sender<Readiness>,
}

impl EngineService {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Arc<Self> {
        let (ready_tx, _) = watch::channel(Readiness::Pending);
        Arc::new(Self { engine, ready_tx })
    }

    /// Run warm-up on a background task; readiness flips when it finishes
    pub fn spawn_initialize(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.initialize().await;
        })
    }

    /// Run warm-up in place
    pub async fn initialize(&self) {
        tracing::info!(engine = self.engine.name(), "Initializing OCR engine");

        let state = match self.engine.warm_up().await {
            Ok(()) => {
                tracing::info!(engine = self.engine.name(), "OCR engine ready");
                Readiness::Ready
            }
            Err(e) => {
                tracing::error!(
                    engine = self.engine.name(),
                    error = %e,
                    "OCR engine failed to initialize"
                );
                Readiness::Failed(e.to_string())
            }
        };
        self.ready_tx.send_replace(state);
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow() == Readiness::Ready
    }

    /// Wait until warm-up completed, or fail with `EngineNotReady`
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), ExtractionError> {
        let mut rx = self.ready_tx.subscribe();

        let waited = tokio::time::timeout(timeout, rx.wait_for(|r| *r != Readiness::Pending)).await;

        match waited {
            Ok(Ok(state)) => match &*state {
                Readiness::Ready => Ok(()),
                Readiness::Failed(reason) => Err(ExtractionError::EngineNotReady(reason.clone())),
                Readiness::Pending => {
                    Err(ExtractionError::EngineNotReady("still initializing".to_string()))
                }
            },
            Ok(Err(_)) => {
                Err(ExtractionError::EngineNotReady("engine service dropped".to_string()))
            }
            Err(_) => Err(ExtractionError::EngineNotReady(format!(
                "initialization did not finish within {}s",
                timeout.as_secs()
            ))),
        }
    }

    pub fn name(&self) -> &str {
        self.engine.name()
    }

    /// Recognize text once the engine is ready
    pub async fn recognize(
        &self,
        image: &ImageHandle,
        options: &RecognitionOptions,
        progress: &dyn ProgressSink,
        ready_timeout: Duration,
    ) -> Result<RecognizedText, ExtractionError> {
        self.wait_ready(ready_timeout).await?;
        self.engine.recognize(image, options, progress).await
    }
}
