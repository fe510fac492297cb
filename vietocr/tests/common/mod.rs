// Shared helpers for the integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Luma};

use vietocr::config::Config;
use vietocr::ocr::{EngineCapabilities, EngineError, EngineOutput, OcrEngine};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// What a [`FakeEngine`] answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String, Option<f32>),
    Fail,
    /// Text growing by one `x` per call, so every call beats the previous one.
    Growing,
}

/// Engine double that records how often it was called.
pub struct FakeEngine {
    reply: Reply,
    calls: AtomicUsize,
}

impl FakeEngine {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn text(text: &str) -> Arc<Self> {
        Self::new(Reply::Text(text.to_string(), None))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    async fn recognize(
        &self,
        image_path: &Path,
        _language: &str,
        _psm: u8,
        _timeout: Duration,
    ) -> Result<EngineOutput, EngineError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        assert!(image_path.exists(), "variant image should be on disk");

        match &self.reply {
            Reply::Text(text, confidence) => Ok(EngineOutput {
                text: text.clone(),
                mean_confidence: *confidence,
            }),
            Reply::Fail => Err(EngineError::Failed {
                status: "exit status: 1".to_string(),
                stderr: "Error opening data file".to_string(),
            }),
            Reply::Growing => Ok(EngineOutput {
                text: "x".repeat(call),
                mean_confidence: None,
            }),
        }
    }
}

/// Config with the given PSM list and demo mode off.
pub fn test_config(psm_modes: &[u8]) -> Config {
    let mut config = Config::default();
    config.ocr.demo_mode = false;
    config.ocr.default_language = "vie".to_string();
    config.ocr.fallback_language = "eng".to_string();
    config.search.psm_modes = psm_modes.to_vec();
    config.search.early_exit_chars = 100;
    config.search.min_viable_chars = 2;
    config
}

pub fn installed(languages: &[&str]) -> EngineCapabilities {
    EngineCapabilities {
        installed: true,
        version: Some("5.3.0".to_string()),
        languages: languages.iter().map(|l| l.to_string()).collect(),
        pdf_support: false,
    }
}

/// A page-like test image: white background with a dark bar.
pub fn document_image(width: u32, height: u32) -> DynamicImage {
    let img = image::GrayImage::from_fn(width, height, |x, y| {
        let in_bar = y > height / 3 && y < height / 2 && x > width / 8 && x < width * 7 / 8;
        if in_bar {
            Luma([20u8])
        } else {
            Luma([235u8])
        }
    });
    DynamicImage::ImageLuma8(img)
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut out = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode test png");
    out
}
