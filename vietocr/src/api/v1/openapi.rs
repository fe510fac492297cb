use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "vietocr API",
        version = "1.0.0",
        description = "OCR for Vietnamese documents: best-effort Tesseract search over preprocessing variants, languages and page-segmentation modes, plus text normalization.",
    ),
    paths(
        handlers::health::health_check,
        handlers::languages::list_languages,
        handlers::ocr::process_ocr,
        handlers::text::clean_text,
        handlers::image::enhance_image,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // OCR
        dto::OcrResponse,
        dto::OcrMetadata,
        dto::CleaningSummary,
        crate::ocr::ConfidenceSource,
        crate::ocr::EngineCapabilities,
        // Text
        dto::CleanTextRequest,
        crate::text::CleaningResult,
        crate::text::CleaningStats,
        // Image
        dto::EnhanceImageResponse,
        crate::ocr::ImageStats,
        // Handler-local types
        handlers::health::HealthData,
        handlers::languages::LanguageInfo,
        handlers::languages::LanguagesData,
    )),
    tags(
        (name = "health", description = "Health check and engine capabilities"),
        (name = "ocr", description = "Document OCR and installed languages"),
        (name = "text", description = "Vietnamese text normalization"),
        (name = "image", description = "Preprocessing preview for uploaded images"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
