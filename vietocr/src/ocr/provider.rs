use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::{Config, OcrConfig};
use crate::error::{Result, VietOcrError};

use super::capability::EngineCapabilities;
use super::engine::{OcrEngine, TesseractCli};
use super::pdf::{is_pdf, PdfRasterizer};
use super::preprocessing::decode_image;
use super::search::{summarize, BestEffortSearch};
use super::types::{ConfidenceSource, OcrResult};

/// Returned instead of OCR output while no engine is installed, so client
/// integrations can be exercised end to end.
pub const DEMO_TEXT: &str = "\
CỘNG HÒA XÃ HỘI CHỦ NGHĨA VIỆT NAM
Độc lập - Tự do - Hạnh phúc

CĂN CƯỚC CÔNG DÂN

Số: 001234567890
Họ và tên: NGUYỄN VĂN A
Ngày sinh: 01/01/1990
Giới tính: Nam
Quốc tịch: Việt Nam
Quê quán: Hà Nội, Việt Nam
Nơi thường trú: 123 Đường ABC, Phường XYZ, Quận DEF, Hà Nội

[DEMO MODE - Tesseract OCR not installed]";

/// Per-call hints that come with an upload.
#[derive(Debug, Clone, Default)]
pub struct RecognizeRequest {
    /// Engine language code, e.g. `vie`. Falls back to the configured default.
    pub language: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
enum OcrBackend {
    Tesseract {
        search: BestEffortSearch,
        /// `None` when pdftoppm was not found at startup.
        rasterizer: Option<PdfRasterizer>,
    },
    Unavailable {
        reason: String,
    },
}

/// OCR strategy chosen once at startup from the capability probe.
#[derive(Clone)]
pub struct OcrProvider {
    backend: OcrBackend,
    config: OcrConfig,
    capabilities: Arc<EngineCapabilities>,
}

impl OcrProvider {
    pub fn new(config: &Config, capabilities: EngineCapabilities) -> Self {
        if !capabilities.installed {
            let reason = format!(
                "tesseract not found at '{}' (install tesseract-ocr and tesseract-ocr-vie)",
                config.ocr.tesseract_path
            );
            warn!("{}", reason);
            return Self {
                backend: OcrBackend::Unavailable { reason },
                config: config.ocr.clone(),
                capabilities: Arc::new(capabilities),
            };
        }

        let engine = Arc::new(TesseractCli::new(&config.ocr.tesseract_path));
        Self::with_engine(config, capabilities, engine)
    }

    /// Use `engine` regardless of what the probe found.
    pub fn with_engine(
        config: &Config,
        capabilities: EngineCapabilities,
        engine: Arc<dyn OcrEngine>,
    ) -> Self {
        info!(
            engine = engine.name(),
            psm_modes = ?config.search.psm_modes,
            "OCR engine initialized"
        );
        let rasterizer = capabilities
            .pdf_support
            .then(|| PdfRasterizer::new(&config.pdf));

        Self {
            backend: OcrBackend::Tesseract {
                search: BestEffortSearch::new(engine, config.search.clone()),
                rasterizer,
            },
            config: config.ocr.clone(),
            capabilities: Arc::new(capabilities),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub fn capabilities(&self) -> Arc<EngineCapabilities> {
        Arc::clone(&self.capabilities)
    }

    pub fn supports_pdf(&self) -> bool {
        matches!(
            self.backend,
            OcrBackend::Tesseract {
                rasterizer: Some(_),
                ..
            }
        )
    }

    /// Extract text from an uploaded image or PDF.
    ///
    /// Every page and attempt shares one `timeout_secs` budget. When it runs
    /// out the best text found so far is returned, still as a success.
    /// Scratch files are removed on every exit path.
    pub async fn recognize(&self, bytes: &[u8], request: &RecognizeRequest) -> Result<OcrResult> {
        if bytes.is_empty() {
            return Err(VietOcrError::InvalidInput("Uploaded file is empty".to_string()));
        }

        let started = Instant::now();
        let deadline = started + Duration::from_secs(self.config.timeout_secs);
        let requested = request
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.config.default_language.as_str());

        let (search, rasterizer) = match &self.backend {
            OcrBackend::Tesseract { search, rasterizer } => (search, rasterizer),
            OcrBackend::Unavailable { reason } => {
                self.validate_upload(bytes, request).await?;
                tracing::debug!("Answering without OCR engine: {}", reason);
                return Ok(self.fallback_result(requested, started.elapsed()));
            }
        };

        let languages = self.languages_for(requested);
        let workdir = tempfile::Builder::new().prefix("vietocr-").tempdir()?;

        let pages = if is_pdf_upload(bytes, request) {
            let rasterizer = rasterizer.as_ref().ok_or_else(|| {
                VietOcrError::OcrUnavailable(
                    "PDF uploads need pdftoppm (install poppler-utils)".to_string(),
                )
            })?;
            let page_paths = rasterizer
                .rasterize(bytes, workdir.path(), remaining_budget(deadline))
                .await?;

            let mut outcomes = Vec::with_capacity(page_paths.len());
            for (index, path) in page_paths.iter().enumerate() {
                if Instant::now() >= deadline {
                    warn!(
                        skipped = page_paths.len() - index,
                        "OCR budget exhausted, skipping remaining pages"
                    );
                    break;
                }
                let page_bytes = tokio::fs::read(path).await?;
                let image = self.decode(page_bytes).await?;
                let outcome = search
                    .run_until(image, &languages, workdir.path(), deadline)
                    .await?;
                tracing::debug!(page = index + 1, attempts = outcome.attempts, "Page searched");
                outcomes.push(outcome);
            }
            outcomes
        } else {
            let image = self.decode(bytes.to_vec()).await?;
            vec![
                search
                    .run_until(image, &languages, workdir.path(), deadline)
                    .await?,
            ]
        };

        let result = summarize(
            &pages,
            search.config().min_viable_chars,
            requested,
            started.elapsed(),
        );

        info!(
            method = %result.method_label,
            pages = result.page_count,
            attempts = result.attempts,
            failed = result.failed_attempts,
            early_exit = result.early_exit,
            deadline_reached = result.deadline_reached,
            chars = result.text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "OCR finished"
        );

        Ok(result)
    }

    fn languages_for(&self, requested: &str) -> Vec<String> {
        if self.capabilities.supports_language(requested) {
            BestEffortSearch::languages(requested, &self.config.fallback_language)
        } else {
            warn!(
                language = requested,
                fallback = %self.config.fallback_language,
                "Requested language is not installed, using fallback only"
            );
            vec![self.config.fallback_language.clone()]
        }
    }

    /// Reject uploads that are neither a PDF nor a decodable image, even
    /// when no engine would look at them.
    async fn validate_upload(&self, bytes: &[u8], request: &RecognizeRequest) -> Result<()> {
        if is_pdf_upload(bytes, request) {
            if infer::is(bytes, "pdf") {
                return Ok(());
            }
            return Err(VietOcrError::InvalidInput(
                "Uploaded file is not a valid PDF".to_string(),
            ));
        }
        self.decode(bytes.to_vec()).await.map(|_| ())
    }

    async fn decode(&self, bytes: Vec<u8>) -> Result<Arc<image::DynamicImage>> {
        let config = self.config.clone();
        let image = tokio::task::spawn_blocking(move || decode_image(&bytes, &config))
            .await
            .map_err(|e| VietOcrError::Internal(format!("Image decoding task failed: {e}")))??;
        Ok(Arc::new(image))
    }

    fn fallback_result(&self, language: &str, elapsed: Duration) -> OcrResult {
        let (text, source, method) = if self.config.demo_mode {
            (DEMO_TEXT.to_string(), ConfidenceSource::Demo, "demo_mode")
        } else {
            (String::new(), ConfidenceSource::None, "engine_unavailable")
        };

        OcrResult {
            success: true,
            text,
            confidence: 0.0,
            confidence_source: source,
            method_label: method.to_string(),
            preprocessing: "none".to_string(),
            language: language.to_string(),
            processing_time_seconds: elapsed.as_secs_f64(),
            attempts: 0,
            failed_attempts: 0,
            early_exit: false,
            deadline_reached: false,
            page_count: 1,
            engine_available: false,
        }
    }
}

fn is_pdf_upload(bytes: &[u8], request: &RecognizeRequest) -> bool {
    is_pdf(
        bytes,
        request.file_name.as_deref(),
        request.content_type.as_deref(),
    )
}

/// What is left of the request budget, never less than one second so a
/// subprocess always gets a chance to start.
fn remaining_budget(deadline: Instant) -> Duration {
    deadline
        .saturating_duration_since(Instant::now())
        .max(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::engine::{EngineError, EngineOutput};
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat};
    use std::path::Path;
    use std::sync::Mutex;

    struct RecordingEngine {
        languages: Mutex<Vec<String>>,
        delay: Duration,
    }

    #[async_trait]
    impl OcrEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        async fn recognize(
            &self,
            _image_path: &Path,
            language: &str,
            _psm: u8,
            _timeout: Duration,
        ) -> std::result::Result<EngineOutput, EngineError> {
            self.languages.lock().unwrap().push(language.to_string());
            tokio::time::sleep(self.delay).await;
            Ok(EngineOutput {
                text: "Số: 001234567890".to_string(),
                mean_confidence: Some(77.0),
            })
        }
    }

    fn recording(delay: Duration) -> Arc<RecordingEngine> {
        Arc::new(RecordingEngine {
            languages: Mutex::new(Vec::new()),
            delay,
        })
    }

    fn config(demo_mode: bool) -> Config {
        let mut config = Config::default();
        config.ocr.demo_mode = demo_mode;
        config.ocr.default_language = "vie".to_string();
        config.ocr.fallback_language = "eng".to_string();
        config.search.psm_modes = vec![3];
        config
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::new_luma8(width, height)
            .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn installed(languages: &[&str]) -> EngineCapabilities {
        EngineCapabilities {
            installed: true,
            version: Some("5.3.0".to_string()),
            languages: languages.iter().map(|l| l.to_string()).collect(),
            pdf_support: false,
        }
    }

    #[tokio::test]
    async fn test_unavailable_demo_mode_returns_demo_text() {
        let provider = OcrProvider::new(&config(true), EngineCapabilities::unavailable());
        assert!(!provider.is_available());

        let result = provider
            .recognize(&png(20, 20), &RecognizeRequest::default())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.text, DEMO_TEXT);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.confidence_source, ConfidenceSource::Demo);
        assert_eq!(result.method_label, "demo_mode");
        assert!(!result.engine_available);
    }

    #[tokio::test]
    async fn test_unavailable_without_demo_mode_returns_empty_text() {
        let provider = OcrProvider::new(&config(false), EngineCapabilities::unavailable());
        let result = provider
            .recognize(&png(20, 20), &RecognizeRequest::default())
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.text.is_empty());
        assert_eq!(result.method_label, "engine_unavailable");
    }

    #[tokio::test]
    async fn test_unavailable_still_rejects_unreadable_upload() {
        for demo_mode in [true, false] {
            let provider =
                OcrProvider::new(&config(demo_mode), EngineCapabilities::unavailable());
            let err = provider
                .recognize(b"this is not an image", &RecognizeRequest::default())
                .await
                .unwrap_err();
            assert!(matches!(err, VietOcrError::InvalidInput(_)), "demo_mode={demo_mode}");
        }
    }

    #[tokio::test]
    async fn test_unavailable_checks_pdf_signature() {
        let provider = OcrProvider::new(&config(true), EngineCapabilities::unavailable());

        let result = provider
            .recognize(b"%PDF-1.4\n%%EOF\n", &RecognizeRequest::default())
            .await
            .unwrap();
        assert_eq!(result.method_label, "demo_mode");

        let request = RecognizeRequest {
            file_name: Some("scan.pdf".to_string()),
            ..Default::default()
        };
        let err = provider
            .recognize(b"plain text pretending", &request)
            .await
            .unwrap_err();
        assert!(matches!(err, VietOcrError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_empty_upload_is_invalid() {
        let provider = OcrProvider::new(&config(true), EngineCapabilities::unavailable());
        let err = provider
            .recognize(&[], &RecognizeRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VietOcrError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_engine_backend_runs_search() {
        let engine = recording(Duration::ZERO);
        let provider =
            OcrProvider::with_engine(&config(true), installed(&["eng", "vie"]), engine.clone());
        assert!(provider.is_available());
        assert!(!provider.supports_pdf());

        let result = provider
            .recognize(&png(60, 40), &RecognizeRequest::default())
            .await
            .unwrap();
        assert_eq!(result.text, "Số: 001234567890");
        assert_eq!(result.confidence, 77.0);
        assert_eq!(result.confidence_source, ConfidenceSource::Engine);
        assert_eq!(result.attempts, 12);
        assert!(result.engine_available);

        let languages = engine.languages.lock().unwrap();
        assert_eq!(languages.first().map(String::as_str), Some("vie"));
        assert!(languages.iter().any(|l| l == "eng"));
    }

    #[tokio::test]
    async fn test_missing_language_uses_fallback_only() {
        let engine = recording(Duration::ZERO);
        let provider = OcrProvider::with_engine(&config(true), installed(&["eng"]), engine.clone());

        let request = RecognizeRequest {
            language: Some("vie".to_string()),
            ..Default::default()
        };
        let result = provider.recognize(&png(60, 40), &request).await.unwrap();
        assert_eq!(result.language, "eng");
        assert!(engine.languages.lock().unwrap().iter().all(|l| l == "eng"));
    }

    #[tokio::test]
    async fn test_corrupt_image_is_invalid_input() {
        let provider = OcrProvider::with_engine(
            &config(true),
            installed(&["vie"]),
            recording(Duration::ZERO),
        );
        let err = provider
            .recognize(b"definitely not an image", &RecognizeRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VietOcrError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_pdf_without_pdftoppm_is_unavailable() {
        let provider = OcrProvider::with_engine(
            &config(true),
            installed(&["vie"]),
            recording(Duration::ZERO),
        );
        let err = provider
            .recognize(b"%PDF-1.4\n%%EOF\n", &RecognizeRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VietOcrError::OcrUnavailable(_)));
    }

    struct StallingEngine;

    #[async_trait]
    impl OcrEngine for StallingEngine {
        fn name(&self) -> &str {
            "stalling"
        }

        async fn recognize(
            &self,
            _image_path: &Path,
            _language: &str,
            _psm: u8,
            timeout: Duration,
        ) -> std::result::Result<EngineOutput, EngineError> {
            tokio::time::sleep(timeout).await;
            Err(EngineError::Timeout(timeout))
        }
    }

    #[tokio::test]
    async fn test_exhausted_budget_is_empty_success() {
        let mut config = config(true);
        config.ocr.timeout_secs = 3;
        config.search.attempt_timeout_secs = 1;
        config.search.psm_modes = crate::config::DEFAULT_PSM_MODES.to_vec();
        let provider = OcrProvider::with_engine(&config, installed(&["vie"]), Arc::new(StallingEngine));

        let started = Instant::now();
        let result = provider
            .recognize(&png(60, 40), &RecognizeRequest::default())
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(6));
        assert!(result.success);
        assert!(result.text.is_empty());
        assert_eq!(result.method_label, crate::ocr::NO_TEXT_METHOD);
        assert!(result.deadline_reached);
        assert!(result.attempts < 48);
        assert_eq!(result.failed_attempts, result.attempts);
    }

    #[tokio::test]
    async fn test_hung_engine_call_is_cut_at_budget() {
        let mut config = config(true);
        config.ocr.timeout_secs = 1;
        let provider =
            OcrProvider::with_engine(&config, installed(&["vie"]), recording(Duration::from_secs(5)));

        let result = provider
            .recognize(&png(60, 40), &RecognizeRequest::default())
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.deadline_reached);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.failed_attempts, 1);
        assert!(result.text.is_empty());
    }
}
