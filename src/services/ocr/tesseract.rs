use async_trait::async_trait;
use tesseract::{PageSegMode as TessPsm, Tesseract};
use super::engine::{OcrEngine, PageSegMode, RecognitionOptions};
use crate::error::ExtractionError;
use crate::models::image_handle::ImageHandle;
use crate::models::ocr_result::RecognizedText;
use crate::models::progress::{ProgressSink, RecognitionProgress, RecognitionStatus};

/// In-process Tesseract OCR engine.
///
/// A Tesseract instance is created per call on the blocking pool; the
/// library handle is not shared across threads. Warm-up loads `language`,
/// which must match the language recognition is run with.
pub struct TesseractEngine {
    datapath: Option<String>,
    language: String,
}

impl TesseractEngine {
    pub fn new(datapath: Option<String>, language: impl Into<String>) -> Self {
        Self {
            datapath,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn datapath(&self) -> Option<&str> {
        self.datapath.as_deref()
    }

    fn map_psm(mode: PageSegMode) -> TessPsm {
        match mode {
            PageSegMode::OsdOnly => TessPsm::PsmOsdOnly,
            PageSegMode::AutoOsd => TessPsm::PsmAutoOsd,
            PageSegMode::AutoOnly => TessPsm::PsmAutoOnly,
            PageSegMode::Auto => TessPsm::PsmAuto,
            PageSegMode::SingleColumn => TessPsm::PsmSingleColumn,
            PageSegMode::SingleBlockVertText => TessPsm::PsmSingleBlockVertText,
            PageSegMode::SingleBlock => TessPsm::PsmSingleBlock,
            PageSegMode::SingleLine => TessPsm::PsmSingleLine,
            PageSegMode::SingleWord => TessPsm::PsmSingleWord,
            PageSegMode::CircleWord => TessPsm::PsmCircleWord,
            PageSegMode::SingleChar => TessPsm::PsmSingleChar,
            PageSegMode::SparseText => TessPsm::PsmSparseText,
            PageSegMode::SparseTextOsd => TessPsm::PsmSparseTextOsd,
            PageSegMode::RawLine => TessPsm::PsmRawLine,
        }
    }

    fn run(
        datapath: Option<&str>,
        bytes: &[u8],
        options: &RecognitionOptions,
    ) -> Result<RecognizedText, ExtractionError> {
        let mut tesseract = Tesseract::new(datapath, Some(&options.language))
            .map_err(|e| {
                ExtractionError::Recognition(format!("Failed to create Tesseract instance: {}", e))
            })?;

        if let Some(mode) = options.page_seg_mode {
            tesseract.set_page_seg_mode(Self::map_psm(mode));
        }

        let mut tesseract = tesseract
            .set_image_from_mem(bytes)
            .map_err(|e| ExtractionError::Decode(format!("Failed to set image: {}", e)))?;

        let text = tesseract
            .get_text()
            .map_err(|e| ExtractionError::Recognition(format!("Failed to recognize text: {}", e)))?;
        let confidence = tesseract.mean_text_conf();

        Ok(RecognizedText {
            text,
            confidence: Some(confidence as f32),
        })
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    /// Verify the configured language data loads
    async fn warm_up(&self) -> Result<(), ExtractionError> {
        let datapath = self.datapath.clone();
        let language = self.language.clone();
        tokio::task::spawn_blocking(move || {
            Tesseract::new(datapath.as_deref(), Some(&language))
                .map(|_| ())
                .map_err(|e| {
                    ExtractionError::EngineNotReady(format!(
                        "Tesseract could not load language '{}': {}",
                        language, e
                    ))
                })
        })
        .await
        .map_err(|e| {
            ExtractionError::EngineNotReady(format!("Tesseract warm-up task failed: {}", e))
        })?
    }

    async fn recognize(
        &self,
        image: &ImageHandle,
        options: &RecognitionOptions,
        progress: &dyn ProgressSink,
    ) -> Result<RecognizedText, ExtractionError> {
        progress.on_progress(RecognitionProgress::new(RecognitionStatus::InitializingApi, 0.0));

        let datapath = self.datapath.clone();
        let bytes = image.bytes().to_vec();
        let options = options.clone();

        progress.on_progress(RecognitionProgress::recognizing(0.0));
        let result =
            tokio::task::spawn_blocking(move || Self::run(datapath.as_deref(), &bytes, &options))
                .await
            .map_err(|e| ExtractionError::Recognition(format!("Tesseract task failed: {}", e)))??;
        progress.on_progress(RecognitionProgress::recognizing(1.0));

        Ok(result)
    }
}
