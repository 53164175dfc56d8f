use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use super::engine::{OcrEngine, RecognitionOptions};
use crate::error::ExtractionError;
use crate::models::image_handle::ImageHandle;
use crate::models::ocr_result::RecognizedText;
use crate::models::progress::{ProgressSink, RecognitionProgress, RecognitionStatus};

/// HTTP OCR engine that talks to an OCR server exposing `/health` and `/ocr`
#[derive(Clone)]
pub struct HttpOcrEngine {
    client: reqwest::Client,
    base_url: String,
    ready_timeout: Duration,
}

#[derive(Serialize, Debug, PartialEq)]
struct OcrRequest<'a> {
    image_base64: String,
    mime_type: &'a str,
    lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    psm: Option<u8>,
}

#[derive(Deserialize, Debug)]
struct OcrResponse {
    text: String,
    #[serde(default)]
    confidence: Option<f32>,
}

impl HttpOcrEngine {
    /// Create a new HTTP OCR engine
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        ready_timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                ExtractionError::Recognition(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ready_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check if server is healthy
    pub async fn health_check(&self) -> bool {
        match self.client.get(self.endpoint("health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn build_request<'a>(
        image: &'a ImageHandle,
        options: &'a RecognitionOptions,
    ) -> OcrRequest<'a> {
        OcrRequest {
            image_base64: general_purpose::STANDARD.encode(image.bytes()),
            mime_type: image.mime_type(),
            lang: &options.language,
            psm: options.page_seg_mode.map(|m| m.as_psm()),
        }
    }
}

#[async_trait]
impl OcrEngine for HttpOcrEngine {
    fn name(&self) -> &str {
        "http"
    }

    /// Poll the health endpoint until the server answers
    async fn warm_up(&self) -> Result<(), ExtractionError> {
        let delay = Duration::from_millis(500);
        let max_attempts = (self.ready_timeout.as_millis() / delay.as_millis()).max(1) as u32;

        for attempt in 1..=max_attempts {
            if self.health_check().await {
                tracing::debug!(attempt, url = %self.base_url, "OCR server healthy");
                return Ok(());
            }

            if attempt % 4 == 0 {
                tracing::info!(attempt, max_attempts, "Waiting for OCR server...");
            }
            sleep(delay).await;
        }

        Err(ExtractionError::EngineNotReady(format!(
            "OCR server at {} did not become healthy within {}s",
            self.base_url,
            self.ready_timeout.as_secs()
        )))
    }

    async fn recognize(
        &self,
        image: &ImageHandle,
        options: &RecognitionOptions,
        progress: &dyn ProgressSink,
    ) -> Result<RecognizedText, ExtractionError> {
        progress.on_progress(RecognitionProgress::new(RecognitionStatus::InitializingApi, 0.0));

        let request = Self::build_request(image, options);
        progress.on_progress(RecognitionProgress::recognizing(0.0));

        let response = self
            .client
            .post(self.endpoint("ocr"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Recognition(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ExtractionError::Recognition(format!(
                "OCR server error ({}): {}",
                status, error_text
            )));
        }

        let data: OcrResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Recognition(format!("Failed to parse response: {}", e)))?;

        progress.on_progress(RecognitionProgress::recognizing(1.0));

        Ok(RecognizedText {
            text: data.text,
            confidence: data.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::image_handle::ImageOrigin;
    use crate::models::progress::NoProgress;
    use crate::services::ocr::engine::PageSegMode;

    fn handle() -> ImageHandle {
        ImageHandle::new(vec![1u8, 2, 3], image::ImageFormat::Png, 1, 1, ImageOrigin::Memory)
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let engine = HttpOcrEngine::new(
            "http://localhost:9000/",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(engine.base_url(), "http://localhost:9000");
        assert_eq!(engine.endpoint("/ocr"), "http://localhost:9000/ocr");
        assert_eq!(engine.endpoint("health"), "http://localhost:9000/health");
    }

    #[test]
    fn test_request_body() {
        let image = handle();
        let options = RecognitionOptions {
            language: "eng".to_string(),
            page_seg_mode: Some(PageSegMode::SingleBlock),
        };

        let body = serde_json::to_value(HttpOcrEngine::build_request(&image, &options)).unwrap();
        assert_eq!(body["image_base64"], "AQID");
        assert_eq!(body["mime_type"], "image/png");
        assert_eq!(body["lang"], "eng");
        assert_eq!(body["psm"], 6);

        let no_psm = RecognitionOptions::default();
        let body = serde_json::to_value(HttpOcrEngine::build_request(&image, &no_psm)).unwrap();
        assert!(body.get("psm").is_none());
    }

    #[test]
    fn test_response_without_confidence() {
        let data: OcrResponse = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(data.text, "hello");
        assert!(data.confidence.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_recognition_error() {
        // Port 9 (discard) is closed on test machines
        let engine = HttpOcrEngine::new(
            "http://127.0.0.1:9",
            Duration::from_secs(2),
            Duration::from_millis(500),
        )
        .unwrap();

        let err = engine
            .recognize(&handle(), &RecognitionOptions::default(), &NoProgress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "recognition");

        let err = engine.warm_up().await.unwrap_err();
        assert_eq!(err.kind(), "engine_not_ready");
    }
}
