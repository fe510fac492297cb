use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::ocr::EngineCapabilities;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    /// `healthy` with a working engine, `degraded` without one.
    pub status: String,
    pub service: String,
    pub version: String,
    /// `tesseract`, `demo` or `unavailable`.
    pub processing_mode: String,
    pub vietnamese_available: bool,
    pub engine: EngineCapabilities,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let engine = state.ocr.capabilities();

    let (status, processing_mode) = if state.ocr.is_available() {
        ("healthy", "tesseract")
    } else if state.config.ocr.demo_mode {
        ("degraded", "demo")
    } else {
        ("degraded", "unavailable")
    };

    ApiResponse::success(HealthData {
        status: status.to_string(),
        service: "vietocr".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        processing_mode: processing_mode.to_string(),
        vietnamese_available: engine.installed && engine.languages.iter().any(|l| l == "vie"),
        engine: (*engine).clone(),
    })
}
