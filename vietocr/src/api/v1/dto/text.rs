use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/text:clean`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanTextRequest {
    /// Raw OCR output to normalize. Must not be blank.
    pub text: String,
}
