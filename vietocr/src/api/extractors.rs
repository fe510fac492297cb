use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::VietOcrError;

/// `axum::Json` whose rejections render in the v1 error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(VietOcrError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for VietOcrError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> VietOcrError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                VietOcrError::Validation(format!("Missing required field: {field}"))
            } else {
                VietOcrError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            VietOcrError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            VietOcrError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(_) => {
            VietOcrError::Validation("Failed to read request body".to_string())
        }
        _ => VietOcrError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}
