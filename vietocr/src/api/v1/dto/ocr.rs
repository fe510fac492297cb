//! OCR request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ocr::{ConfidenceSource, OcrResult};
use crate::text::{CleaningResult, CleaningStats};

/// Response body for `POST /v1/ocr:process`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    /// Identifier for this upload, for log correlation.
    pub file_id: String,
    pub success: bool,
    /// Raw engine output.
    pub text: String,
    /// Normalized text, or the raw text when cleaning was disabled.
    pub cleaned_text: String,
    /// Heuristic confidence, 0-100.
    pub confidence: f32,
    pub confidence_source: ConfidenceSource,
    /// e.g. `tesseract_otsu_threshold_vie_psm6`, `tesseract_no_text_found`, `demo_mode`.
    pub processing_method: String,
    pub preprocessing_applied: String,
    pub page_count: u32,
    /// Seconds spent in OCR.
    pub processing_time: f64,
    pub metadata: OcrMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub file_size: usize,
    /// Language of the winning attempt.
    pub language: String,
    pub attempts: usize,
    pub failed_attempts: usize,
    pub early_exit: bool,
    /// The OCR time budget ran out before every attempt was made.
    pub deadline_reached: bool,
    pub engine_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningSummary>,
    /// Set when the text is not real OCR output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[schema(value_type = String)]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleaningSummary {
    pub applied_steps: Vec<String>,
    pub stats: CleaningStats,
}

impl OcrResponse {
    pub fn new(
        file_id: String,
        result: OcrResult,
        cleaning: Option<CleaningResult>,
        file_name: Option<String>,
        file_size: usize,
    ) -> Self {
        let notice = match result.confidence_source {
            ConfidenceSource::Demo => Some(
                "This is demo text. Install Tesseract with the Vietnamese language pack for real OCR."
                    .to_string(),
            ),
            _ if !result.engine_available => {
                Some("Tesseract is not installed on this host.".to_string())
            }
            _ => None,
        };

        let (cleaned_text, cleaning) = match cleaning {
            Some(c) => (
                c.cleaned_text,
                Some(CleaningSummary {
                    applied_steps: c.applied_steps,
                    stats: c.stats,
                }),
            ),
            None => (result.text.clone(), None),
        };

        Self {
            file_id,
            success: result.success,
            text: result.text,
            cleaned_text,
            confidence: result.confidence,
            confidence_source: result.confidence_source,
            processing_method: result.method_label,
            preprocessing_applied: result.preprocessing,
            page_count: result.page_count,
            processing_time: result.processing_time_seconds,
            metadata: OcrMetadata {
                file_name,
                file_size,
                language: result.language,
                attempts: result.attempts,
                failed_attempts: result.failed_attempts,
                early_exit: result.early_exit,
                deadline_reached: result.deadline_reached,
                engine_available: result.engine_available,
                cleaning,
                notice,
                timestamp: Utc::now(),
            },
        }
    }
}
