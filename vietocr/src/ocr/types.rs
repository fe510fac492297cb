use serde::{Deserialize, Serialize};

use super::preprocessing::PreprocessVariant;

/// Where an [`OcrResult`]'s confidence number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    /// Mean word confidence reported by the engine itself.
    Engine,
    /// Length-based placeholder, `min(95, 50 + chars / 2)`.
    Synthetic,
    /// No usable text, confidence is zero.
    None,
    /// Canned text returned while no engine is installed.
    Demo,
}

/// One (variant, language, mode) invocation of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrAttempt {
    pub variant: PreprocessVariant,
    pub language: String,
    pub psm: u8,
    pub text: String,
    /// Character count of the trimmed text.
    pub text_length: usize,
    pub engine_confidence: Option<f32>,
}

impl OcrAttempt {
    pub fn method_label(&self) -> String {
        format!(
            "tesseract_{}_{}_psm{}",
            self.variant.as_str(),
            self.language,
            self.psm
        )
    }
}

/// Outcome of a `recognize` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub success: bool,
    pub text: String,
    /// Heuristic, 0-100.
    pub confidence: f32,
    pub confidence_source: ConfidenceSource,
    pub method_label: String,
    /// Winning preprocessing variant, or `none`.
    pub preprocessing: String,
    /// Language of the winning attempt, or the requested language.
    pub language: String,
    pub processing_time_seconds: f64,
    /// Engine invocations made across all pages.
    pub attempts: usize,
    /// Invocations that errored or timed out.
    pub failed_attempts: usize,
    pub early_exit: bool,
    /// The request budget ran out; the text is the best found until then.
    pub deadline_reached: bool,
    pub page_count: u32,
    /// False when the answer comes from the no-engine fallback.
    pub engine_available: bool,
}

/// Synthetic confidence used when the engine reports none.
pub fn synthetic_confidence(text_length: usize) -> f32 {
    (50 + text_length / 2).min(95) as f32
}
