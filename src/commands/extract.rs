use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use crate::error::ExtractionError;
use crate::models::config::{AppConfig, EngineKind, RecognitionConfig};
use crate::services::image_source::ImageSource;
use crate::services::ocr::{EngineService, HttpOcrEngine, OcrEngine, PageSegMode};
use crate::services::pipeline::{JobOutcome, PipelineController, PipelineSettings};
use crate::services::share::{share_url, Clipboard, LinkOpener};

/// Command-line overrides layered on top of the loaded config
#[derive(Debug, Clone, Default)]
pub struct ExtractOverrides {
    pub preprocess: Option<bool>,
    pub normalize: Option<bool>,
    pub language: Option<String>,
    pub page_seg_mode: Option<PageSegMode>,
    pub engine: Option<EngineKind>,
    pub server_url: Option<String>,
    pub tessdata_path: Option<String>,
}

impl ExtractOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(enabled) = self.preprocess {
            config.preprocessing.enabled = enabled;
        }
        if let Some(enabled) = self.normalize {
            config.normalization.enabled = enabled;
        }
        if let Some(language) = &self.language {
            config.recognition.language = language.clone();
        }
        if let Some(mode) = self.page_seg_mode {
            config.recognition.page_seg_mode = Some(mode);
        }
        if let Some(engine) = self.engine {
            config.recognition.engine = engine;
        }
        if let Some(url) = &self.server_url {
            config.recognition.server_url = url.clone();
        }
        if let Some(path) = &self.tessdata_path {
            config.recognition.tessdata_path = Some(path.clone());
        }
    }
}

/// Result actions requested alongside extraction
#[derive(Debug, Clone, Default)]
pub struct ResultActions {
    pub json: bool,
    pub copy: bool,
    pub share: bool,
    pub show_progress: bool,
}

/// Platform capabilities used by the result actions
pub struct Capabilities<'a> {
    pub clipboard: &'a dyn Clipboard,
    pub opener: &'a dyn LinkOpener,
}

/// Build the configured OCR engine
pub fn build_engine(config: &RecognitionConfig) -> Result<Arc<dyn OcrEngine>, ExtractionError> {
    match config.engine {
        EngineKind::Http => {
            let engine = HttpOcrEngine::new(
                &config.server_url,
                Duration::from_secs(config.request_timeout_secs),
                Duration::from_secs(config.ready_timeout_secs),
            )?;
            Ok(Arc::new(engine))
        }
        #[cfg(feature = "tesseract")]
        EngineKind::Tesseract => Ok(Arc::new(crate::services::ocr::TesseractEngine::new(
            config.tessdata_path.clone(),
            config.language.clone(),
        ))),
        #[cfg(not(feature = "tesseract"))]
        EngineKind::Tesseract => Err(ExtractionError::EngineNotReady(
            "this build does not include the tesseract engine (enable the `tesseract` feature)"
                .to_string(),
        )),
    }
}

/// Draw `Extracting... N%` on stderr until the job stops loading
fn spawn_progress_renderer(controller: &PipelineController) -> tokio::task::JoinHandle<()> {
    let mut rx = controller.subscribe();
    tokio::spawn(async move {
        let mut last = None;
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            if !state.loading {
                break;
            }
            if last != Some(state.progress) {
                last = Some(state.progress);
                eprint!("\rExtracting... {}%", state.progress);
                let _ = std::io::stderr().flush();
            }
        }
        if last.is_some() {
            eprintln!();
        }
    })
}

/// Load `path`, extract its text with `service` and run the requested
/// result actions.
///
/// `service` is the process-wide engine; its warm-up is started by the
/// caller. Returns the job outcome; failures are reported on stderr.
pub async fn run_extract(
    config: &AppConfig,
    service: Arc<EngineService>,
    path: PathBuf,
    actions: &ResultActions,
    capabilities: &Capabilities<'_>,
    out: &mut dyn Write,
) -> Result<JobOutcome> {
    let controller = PipelineController::new(service, PipelineSettings::from_config(config));

    let image = match ImageSource::new(config.limits.clone()).load(&path) {
        Ok(image) => image,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to load image");
            eprintln!("{}", e.user_message());
            return Ok(JobOutcome::Failed(e));
        }
    };
    controller.select_image(image);

    let renderer = actions.show_progress.then(|| spawn_progress_renderer(&controller));
    let outcome = controller.extract_selected().await;
    if let Some(renderer) = renderer {
        // A skipped job never publishes a state change
        if matches!(outcome, JobOutcome::Skipped) {
            renderer.abort();
        }
        let _ = renderer.await;
    }

    match &outcome {
        JobOutcome::Completed(extracted) => {
            if actions.json {
                serde_json::to_writer_pretty(&mut *out, extracted)
                    .context("Failed to write JSON result")?;
                writeln!(out)?;
            } else if extracted.is_empty() {
                eprintln!("No text found in image.");
            } else {
                writeln!(out, "{}", extracted.text)?;
            }

            if !extracted.is_empty() {
                run_actions(config, &extracted.text, actions, capabilities);
            }
        }
        JobOutcome::Failed(e) => eprintln!("{}", e.user_message()),
        JobOutcome::Skipped | JobOutcome::Superseded { .. } => {}
    }

    Ok(outcome)
}

/// Copy / share; failures are reported but do not fail the extraction
fn run_actions(
    config: &AppConfig,
    text: &str,
    actions: &ResultActions,
    capabilities: &Capabilities<'_>,
) {
    if actions.copy {
        match capabilities.clipboard.copy(text) {
            Ok(()) => eprintln!("Copied to clipboard!"),
            Err(e) => {
                tracing::warn!(error = %e, "Copy failed");
                eprintln!("Could not copy to clipboard: {}", e);
            }
        }
    }

    if actions.share {
        let url = share_url(&config.share.base_url, text);
        if let Err(e) = capabilities.opener.open(&url) {
            tracing::warn!(error = %e, "Share failed");
            eprintln!("Could not open share link: {}\n{}", e, url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use crate::models::image_handle::ImageHandle;
    use crate::models::ocr_result::RecognizedText;
    use crate::models::progress::ProgressSink;
    use crate::services::ocr::RecognitionOptions;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use parking_lot::Mutex;

    /// Engine that returns the same text for every call
    struct FixedEngine {
        text: String,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl OcrEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn recognize(
            &self,
            _image: &ImageHandle,
            _options: &RecognitionOptions,
            _progress: &dyn ProgressSink,
        ) -> Result<RecognizedText, ExtractionError> {
            *self.calls.lock() += 1;
            Ok(RecognizedText::new(self.text.clone()))
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        copied: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn copy(&self, text: &str) -> Result<(), CapabilityError> {
            if self.fail {
                return Err(CapabilityError::Unavailable {
                    capability: "clipboard",
                    tried: "none".to_string(),
                });
            }
            self.copied.lock().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl LinkOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<(), CapabilityError> {
            self.opened.lock().push(url.to_string());
            Ok(())
        }
    }

    async fn ready_service(text: &str) -> (Arc<EngineService>, Arc<FixedEngine>) {
        let engine = Arc::new(FixedEngine {
            text: text.to_string(),
            calls: Mutex::new(0),
        });
        let service = EngineService::new(engine.clone());
        service.initialize().await;
        (service, engine)
    }

    fn extract_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.preprocessing.enabled = false;
        config.recognition.ready_timeout_secs = 1;
        config
    }

    fn write_png(tag: &str) -> PathBuf {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "img2text-extract-{}-{}-{}",
            tag,
            std::process::id(),
            id
        ));
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("input.png");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([240, 240, 240])));
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    fn cleanup(path: &std::path::Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = AppConfig::default();
        let overrides = ExtractOverrides {
            preprocess: Some(false),
            normalize: Some(false),
            language: Some("fra".to_string()),
            page_seg_mode: Some(PageSegMode::SingleLine),
            engine: None,
            server_url: Some("http://ocr.local:9000".to_string()),
            tessdata_path: Some("/usr/share/tessdata".to_string()),
        };

        overrides.apply(&mut config);

        assert!(!config.preprocessing.enabled);
        assert!(!config.normalization.enabled);
        assert_eq!(config.recognition.language, "fra");
        assert_eq!(config.recognition.page_seg_mode, Some(PageSegMode::SingleLine));
        assert_eq!(config.recognition.engine, EngineKind::Http);
        assert_eq!(config.recognition.server_url, "http://ocr.local:9000");
        assert_eq!(config.recognition.tessdata_path.as_deref(), Some("/usr/share/tessdata"));
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = AppConfig::default();
        ExtractOverrides::default().apply(&mut config);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_build_http_engine() {
        let engine = build_engine(&RecognitionConfig::default()).unwrap();
        assert_eq!(engine.name(), "http");
    }

    #[cfg(not(feature = "tesseract"))]
    #[test]
    fn test_tesseract_engine_requires_feature() {
        let config = RecognitionConfig {
            engine: EngineKind::Tesseract,
            ..RecognitionConfig::default()
        };
        match build_engine(&config) {
            Err(e) => assert_eq!(e.kind(), "engine_not_ready"),
            Ok(_) => panic!("tesseract engine should not be available without the feature"),
        }
    }

    #[cfg(feature = "tesseract")]
    #[test]
    fn test_tesseract_engine_uses_configured_language() {
        let config = RecognitionConfig {
            engine: EngineKind::Tesseract,
            language: "deu".to_string(),
            ..RecognitionConfig::default()
        };
        let engine = build_engine(&config).unwrap();
        assert_eq!(engine.name(), "tesseract");
    }

    #[tokio::test]
    async fn test_plain_output_with_copy_and_share() {
        let (service, engine) = ready_service("  Total: 42 & tax!\n").await;
        let path = write_png("share");
        let clipboard = RecordingClipboard::default();
        let opener = RecordingOpener::default();
        let capabilities = Capabilities {
            clipboard: &clipboard,
            opener: &opener,
        };
        let actions = ResultActions {
            copy: true,
            share: true,
            ..ResultActions::default()
        };
        let mut out = Vec::new();

        let config = extract_config();
        let outcome = run_extract(&config, service, path.clone(), &actions, &capabilities, &mut out)
            .await
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Completed(_)));
        assert_eq!(*engine.calls.lock(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "Total 42 tax\n");
        assert_eq!(*clipboard.copied.lock(), vec!["Total 42 tax".to_string()]);
        assert_eq!(
            *opener.opened.lock(),
            vec!["https://wa.me/?text=Total%2042%20tax".to_string()]
        );

        cleanup(&path);
    }

    #[tokio::test]
    async fn test_json_output() {
        let (service, _engine) = ready_service("hello world").await;
        let path = write_png("json");
        let clipboard = RecordingClipboard::default();
        let opener = RecordingOpener::default();
        let capabilities = Capabilities {
            clipboard: &clipboard,
            opener: &opener,
        };
        let actions = ResultActions {
            json: true,
            ..ResultActions::default()
        };
        let mut out = Vec::new();

        let config = extract_config();
        run_extract(&config, service, path.clone(), &actions, &capabilities, &mut out)
            .await
            .unwrap();

        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["text"], "hello world");
        assert_eq!(report["raw_text"], "hello world");
        assert_eq!(report["engine"], "fixed");
        assert_eq!(report["preprocessed"], false);
        assert_eq!(report["normalized"], true);
        assert!(clipboard.copied.lock().is_empty());
        assert!(opener.opened.lock().is_empty());

        cleanup(&path);
    }

    #[tokio::test]
    async fn test_empty_text_skips_output_and_actions() {
        let (service, _engine) = ready_service(" !!! \n").await;
        let path = write_png("empty");
        let clipboard = RecordingClipboard::default();
        let opener = RecordingOpener::default();
        let capabilities = Capabilities {
            clipboard: &clipboard,
            opener: &opener,
        };
        let actions = ResultActions {
            copy: true,
            share: true,
            ..ResultActions::default()
        };
        let mut out = Vec::new();

        let config = extract_config();
        let outcome = run_extract(&config, service, path.clone(), &actions, &capabilities, &mut out)
            .await
            .unwrap();

        match outcome {
            JobOutcome::Completed(extracted) => assert!(extracted.is_empty()),
            other => panic!("expected Completed, got {:?}", other),
        }
        assert!(out.is_empty());
        assert!(clipboard.copied.lock().is_empty());
        assert!(opener.opened.lock().is_empty());

        cleanup(&path);
    }

    #[tokio::test]
    async fn test_copy_failure_does_not_fail_extraction() {
        let (service, _engine) = ready_service("receipt").await;
        let path = write_png("copyfail");
        let clipboard = RecordingClipboard {
            fail: true,
            ..RecordingClipboard::default()
        };
        let opener = RecordingOpener::default();
        let capabilities = Capabilities {
            clipboard: &clipboard,
            opener: &opener,
        };
        let actions = ResultActions {
            copy: true,
            ..ResultActions::default()
        };
        let mut out = Vec::new();

        let config = extract_config();
        let outcome = run_extract(&config, service, path.clone(), &actions, &capabilities, &mut out)
            .await
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Completed(_)));
        assert_eq!(String::from_utf8(out).unwrap(), "receipt\n");

        cleanup(&path);
    }

    #[tokio::test]
    async fn test_unloadable_image_fails_without_engine_call() {
        let (service, engine) = ready_service("never").await;
        let clipboard = RecordingClipboard::default();
        let opener = RecordingOpener::default();
        let capabilities = Capabilities {
            clipboard: &clipboard,
            opener: &opener,
        };
        let mut out = Vec::new();

        let outcome = run_extract(
            &extract_config(),
            service,
            PathBuf::from("/definitely/not/here.png"),
            &ResultActions::default(),
            &capabilities,
            &mut out,
        )
        .await
        .unwrap();

        match outcome {
            JobOutcome::Failed(e) => assert_eq!(e.kind(), "io"),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(*engine.calls.lock(), 0);
        assert!(out.is_empty());
    }
}
