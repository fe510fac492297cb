//! # V1 API Response Envelope & Error Contract
//!
//! Every v1 endpoint returns an [`ApiResponse<T>`] envelope with three
//! optional top-level fields:
//!
//! ```json
//! {
//!   "data": { ... },                                        // present on success
//!   "meta": { "total": 2 },                                 // optional
//!   "error": { "code": "invalid_request", "message": "..." } // present on error
//! }
//! ```
//!
//! OCR never fails because text could not be found: an unreadable page is a
//! success with empty text. Errors are reserved for bad uploads
//! (`invalid_request`), missing optional tooling (`not_implemented`) and
//! server faults (`internal_error`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::VietOcrError;

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing or empty upload, undecodable image, malformed JSON. HTTP 400.
    InvalidRequest,
    /// An unexpected server-side error occurred. Internal details are never
    /// leaked to the client. HTTP 500.
    InternalError,
    /// A capability the request needs is not installed on this host
    /// (e.g. PDF rasterization). HTTP 501.
    NotImplemented,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::InternalError => write!(f, "internal_error"),
            Self::NotImplemented => write!(f, "not_implemented"),
        }
    }
}

/// Structured error payload within the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
}

/// Metadata for list-shaped responses.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Canonical v1 API response envelope.
///
/// On success, `data` is present and `error` is absent. On error, `error` is
/// present and `data` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            meta: None,
            error: None,
            status: StatusCode::OK,
        }
    }

    pub fn success_with_meta(data: T, meta: ResponseMeta) -> Self {
        Self {
            data: Some(data),
            meta: Some(meta),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            meta: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<VietOcrError> for ApiResponse<T> {
    /// Internal error details are **never** leaked to the client. For
    /// `internal_error` responses a generic message is returned and the real
    /// error is logged via `tracing::error!`.
    fn from(err: VietOcrError) -> Self {
        match err {
            VietOcrError::InvalidInput(ref msg) | VietOcrError::Validation(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            VietOcrError::Json(ref e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }

            VietOcrError::OcrUnavailable(ref msg) => {
                ApiResponse::error(ErrorCode::NotImplemented, msg.clone())
            }

            ref internal @ (VietOcrError::Image(_)
            | VietOcrError::Io(_)
            | VietOcrError::Regex(_)
            | VietOcrError::Internal(_)
            | VietOcrError::Ocr(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_serializes_without_error() {
        let resp = ApiResponse::success("xin chào");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["data"], "xin chào");
        assert!(json.get("error").is_none());
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn error_response_serializes_without_data() {
        let resp = ApiResponse::<()>::error(ErrorCode::InvalidRequest, "empty file");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "invalid_request");
        assert_eq!(json["error"]["message"], "empty file");
    }

    #[test]
    fn success_with_meta_serializes_total() {
        let resp = ApiResponse::success_with_meta(vec!["eng", "vie"], ResponseMeta { total: Some(2) });
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["data"], serde_json::json!(["eng", "vie"]));
        assert_eq!(json["meta"]["total"], 2);
    }

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::InternalError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::NotImplemented.status(),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn error_code_serializes_snake_case() {
        let json = serde_json::to_value(&ErrorCode::NotImplemented).expect("serialize");
        assert_eq!(json, "not_implemented");
        assert_eq!(ErrorCode::InternalError.to_string(), "internal_error");
    }

    #[test]
    fn invalid_input_maps_to_invalid_request() {
        let resp: ApiResponse<()> = VietOcrError::InvalidInput("Image too small".into()).into();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(err.message, "Image too small");
    }

    #[test]
    fn internal_errors_do_not_leak() {
        let resp: ApiResponse<()> = VietOcrError::Ocr("tesseract crashed at /tmp/x".into()).into();
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "An internal error occurred");
    }

    #[test]
    fn io_and_image_errors_map_to_internal_error() {
        let errors = [
            VietOcrError::Io(std::io::Error::other("disk full")),
            VietOcrError::Internal("task panicked".into()),
            VietOcrError::Image(image::ImageError::IoError(std::io::Error::other("bad stream"))),
        ];
        for e in errors {
            let resp: ApiResponse<()> = e.into();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                resp.error.as_ref().expect("error").message,
                "An internal error occurred"
            );
        }
    }

    #[test]
    fn unavailable_maps_to_not_implemented() {
        let resp: ApiResponse<()> = VietOcrError::OcrUnavailable("no pdftoppm".into()).into();
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
