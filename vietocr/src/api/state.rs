use std::sync::Arc;

use crate::config::Config;
use crate::ocr::OcrProvider;
use crate::text::TextNormalizer;

/// Shared, read-only request context. Everything here is built once at
/// startup; requests never mutate it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ocr: OcrProvider,
    pub normalizer: Arc<TextNormalizer>,
}

impl AppState {
    pub fn new(config: Config, ocr: OcrProvider, normalizer: TextNormalizer) -> Self {
        Self {
            config: Arc::new(config),
            ocr,
            normalizer: Arc::new(normalizer),
        }
    }
}
