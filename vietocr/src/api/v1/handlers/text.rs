use axum::extract::State;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::CleanTextRequest;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::text::CleaningResult;

/// `POST /api/v1/text:clean`
///
/// Runs the Vietnamese normalization pipeline on arbitrary text.
#[utoipa::path(
    post,
    path = "/api/v1/text:clean",
    tag = "text",
    operation_id = "text.clean",
    request_body = CleanTextRequest,
    responses(
        (status = 200, description = "Cleaned text with applied steps", body = CleaningResult),
        (status = 400, description = "Blank text or malformed JSON", body = ApiError),
    )
)]
pub async fn clean_text(
    State(state): State<AppState>,
    AppJson(req): AppJson<CleanTextRequest>,
) -> ApiResponse<CleaningResult> {
    if req.text.trim().is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "No text provided");
    }

    let result = state.normalizer.clean(&req.text);
    tracing::debug!(
        steps = result.applied_steps.len(),
        delta = result.stats.length_delta,
        "Text cleaned"
    );
    ApiResponse::success(result)
}
