use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use crate::error::ExtractionError;
use crate::models::config::AppConfig;
use crate::models::image_handle::ImageHandle;
use crate::models::ocr_result::ExtractedText;
use crate::models::progress::{RecognitionProgress, RecognitionStatus};
use crate::services::normalizer::{normalize, WordCharset};
use crate::services::ocr::{EngineService, PreprocessingService, RecognitionOptions};

/// UI-observable pipeline state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineState {
    /// Id of the job that currently owns the state (0 before the first job)
    pub job_id: u64,
    pub loading: bool,
    /// Recognition progress in [0, 100], non-decreasing within a job
    pub progress: u8,
    pub text: String,
    pub last_error: Option<ExtractionError>,
    pub has_image: bool,
}

/// How an `extract` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// No image selected; nothing happened
    Skipped,
    Completed(ExtractedText),
    Failed(ExtractionError),
    /// A newer job started; this job's result was discarded
    Superseded { job_id: u64 },
}

/// Pipeline settings resolved from `AppConfig`
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub preprocess: Option<PreprocessingService>,
    pub normalize: Option<WordCharset>,
    pub options: RecognitionOptions,
    pub ready_timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            preprocess: config
                .preprocessing
                .enabled
                .then(|| PreprocessingService::new(config.preprocessing.clone())),
            normalize: config.normalization.enabled.then_some(config.normalization.charset),
            options: RecognitionOptions {
                language: config.recognition.language.clone(),
                page_seg_mode: config.recognition.page_seg_mode,
            },
            ready_timeout: Duration::from_secs(config.recognition.ready_timeout_secs),
        }
    }
}

struct Inner {
    engine: Arc<EngineService>,
    settings: PipelineSettings,
    generation: AtomicU64,
    image: Mutex<Option<ImageHandle>>,
    state_tx: watch::Sender<PipelineState>,
}

/// Orchestrates image → [preprocess] → recognize → [normalize] → state.
///
/// Single-flight: every `extract` call takes a new job id, and only the job
/// holding the latest id may write progress, text or errors. Older jobs run
/// to completion but their results are dropped.
#[derive(Clone)]
pub struct PipelineController {
    inner: Arc<Inner>,
}

impl PipelineController {
    pub fn new(engine: Arc<EngineService>, settings: PipelineSettings) -> Self {
        let (state_tx, _) = watch::channel(PipelineState::default());
        Self {
            inner: Arc::new(Inner {
                engine,
                settings,
                generation: AtomicU64::new(0),
                image: Mutex::new(None),
                state_tx,
            }),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> PipelineState {
        self.inner.state_tx.borrow().clone()
    }

    /// Receive a snapshot on every state change
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.inner.state_tx.subscribe()
    }

    /// Store a newly selected image and clear the previous result
    pub fn select_image(&self, image: ImageHandle) {
        *self.inner.image.lock() = Some(image);
        self.inner.state_tx.send_modify(|s| {
            s.has_image = true;
            s.text.clear();
            s.last_error = None;
        });
    }

    /// Clear the displayed text
    pub fn clear_text(&self) {
        self.inner.state_tx.send_if_modified(|s| {
            if s.text.is_empty() {
                return false;
            }
            s.text.clear();
            true
        });
    }

    /// Run `extract` on the currently selected image
    pub async fn extract_selected(&self) -> JobOutcome {
        let image = self.inner.image.lock().clone();
        self.extract(image).await
    }

    fn is_current(&self, job_id: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == job_id
    }

    /// Apply `f` to the state only if `job_id` is still the current job
    fn update_if_current(
        &self,
        job_id: u64,
        f: impl FnOnce(&mut PipelineState) -> bool,
    ) -> bool {
        let mut applied = false;
        self.inner.state_tx.send_if_modified(|s| {
            if s.job_id != job_id || !self.is_current(job_id) {
                return false;
            }
            applied = true;
            f(s)
        });
        applied
    }

    /// Extract text from `image`.
    ///
    /// `None` is a no-op. Errors are logged, recorded in state and returned
    /// as `JobOutcome::Failed`; they are never propagated further.
    pub async fn extract(&self, image: Option<ImageHandle>) -> JobOutcome {
        let Some(image) = image else {
            tracing::debug!("Extract requested with no image selected");
            return JobOutcome::Skipped;
        };

        // Bumped under the state lock so job ids and state ownership agree
        let mut job_id = 0;
        self.inner.state_tx.send_modify(|s| {
            job_id = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            s.job_id = job_id;
            s.loading = true;
            s.progress = 0;
            s.last_error = None;
        });
        tracing::info!(job_id, engine = self.inner.engine.name(), "Extraction started");

        let result = self.run_job(job_id, image).await;

        if !self.is_current(job_id) {
            tracing::warn!(job_id, "Discarding result of superseded extraction");
            return JobOutcome::Superseded { job_id };
        }

        match result {
            Ok(extracted) => {
                let text = extracted.text.clone();
                let applied = self.update_if_current(job_id, |s| {
                    s.text = text;
                    s.loading = false;
                    true
                });
                if !applied {
                    return JobOutcome::Superseded { job_id };
                }
                tracing::info!(
                    job_id,
                    chars = extracted.text.chars().count(),
                    "Extraction finished"
                );
                JobOutcome::Completed(extracted)
            }
            Err(e) => {
                let error = e.clone();
                let applied = self.update_if_current(job_id, |s| {
                    s.last_error = Some(error);
                    s.loading = false;
                    true
                });
                if !applied {
                    return JobOutcome::Superseded { job_id };
                }
                tracing::error!(job_id, kind = e.kind(), error = %e, "Error extracting text");
                JobOutcome::Failed(e)
            }
        }
    }

    async fn run_job(
        &self,
        job_id: u64,
        image: ImageHandle,
    ) -> Result<ExtractedText, ExtractionError> {
        let settings = &self.inner.settings;

        let image = match &settings.preprocess {
            Some(service) => {
                let service = service.clone();
                tokio::task::spawn_blocking(move || service.preprocess(&image))
                    .await
                    .map_err(|e| {
                        ExtractionError::Decode(format!("preprocessing task failed: {}", e))
                    })??
            }
            None => image,
        };

        let progress_sink = |p: RecognitionProgress| self.on_progress(job_id, p);
        let recognized = self
            .inner
            .engine
            .recognize(&image, &settings.options, &progress_sink, settings.ready_timeout)
            .await?;

        let trimmed = recognized.text.trim();
        let text = match settings.normalize {
            Some(charset) => normalize(trimmed, charset),
            None => trimmed.to_string(),
        };

        Ok(ExtractedText {
            job_id,
            text,
            raw_text: recognized.text,
            confidence: recognized.confidence,
            preprocessed: settings.preprocess.is_some(),
            normalized: settings.normalize.is_some(),
            engine: self.inner.engine.name().to_string(),
            finished_at: chrono::Utc::now(),
        })
    }

    fn on_progress(&self, job_id: u64, progress: RecognitionProgress) {
        if progress.status != RecognitionStatus::RecognizingText {
            return;
        }

        let percent = progress.percent();
        self.update_if_current(job_id, |s| {
            // Out-of-order or repeated values are ignored
            if percent <= s.progress {
                return false;
            }
            s.progress = percent;
            true
        });
    }
}
