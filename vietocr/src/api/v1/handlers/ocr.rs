//! v1 OCR handler.
//!
//! Accepts a multipart upload, runs the best-effort OCR search and
//! optionally normalizes the extracted text.

use axum::extract::{Multipart, State};
use nanoid::nanoid;

use crate::api::v1::dto::OcrResponse;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::ocr::RecognizeRequest;

fn parse_form_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `POST /api/v1/ocr:process`
///
/// Multipart fields: `file` (required, image or PDF), `language` (engine
/// language code, defaults to the configured one) and `cleanText`
/// (default `true`).
#[utoipa::path(
    post,
    path = "/api/v1/ocr:process",
    tag = "ocr",
    operation_id = "ocr.process",
    request_body(content_type = "multipart/form-data", content = String, description = "File upload with optional language and cleanText fields"),
    responses(
        (status = 200, description = "OCR finished (text may be empty)", body = OcrResponse),
        (status = 400, description = "Missing, empty or unreadable upload", body = ApiError),
        (status = 501, description = "PDF upload without pdftoppm installed", body = ApiError),
    )
)]
pub async fn process_ocr(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResponse<OcrResponse> {
    let max_bytes = state.config.server.max_upload_bytes;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut file_content_type: Option<String> = None;
    let mut language: Option<String> = None;
    let mut clean_text = true;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                if let Some(name) = field.file_name() {
                    file_name = Some(name.to_string());
                }
                if let Some(content_type) = field.content_type() {
                    file_content_type = Some(content_type.to_string());
                }

                let bytes = match field.bytes().await {
                    Ok(b) => b,
                    Err(e) => {
                        return ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            format!("Failed to read file: {e}"),
                        );
                    }
                };

                if bytes.len() > max_bytes {
                    return ApiResponse::error(
                        ErrorCode::InvalidRequest,
                        format!(
                            "File too large: {} bytes (max {} bytes)",
                            bytes.len(),
                            max_bytes
                        ),
                    );
                }

                file_bytes = Some(bytes.to_vec());
            }
            "language" | "lang" => {
                language = match field.text().await {
                    Ok(t) if !t.trim().is_empty() => Some(t.trim().to_string()),
                    Ok(_) => None,
                    Err(e) => {
                        return ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            format!("Invalid language: {e}"),
                        );
                    }
                };
            }
            "cleanText" | "clean_text" => {
                let raw = match field.text().await {
                    Ok(t) => t,
                    Err(e) => {
                        return ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            format!("Invalid cleanText value: {e}"),
                        );
                    }
                };
                match parse_form_bool(&raw) {
                    Some(value) => clean_text = value,
                    None => {
                        return ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            "cleanText must be one of true/false/1/0/yes/no",
                        );
                    }
                }
            }
            _ => {}
        }
    }

    let bytes = match file_bytes {
        Some(b) if !b.is_empty() => b,
        Some(_) => return ApiResponse::error(ErrorCode::InvalidRequest, "Empty file uploaded"),
        None => {
            return ApiResponse::error(ErrorCode::InvalidRequest, "Missing required 'file' field");
        }
    };

    let file_id = format!("ocr_{}", nanoid!());
    tracing::info!(
        file_id = %file_id,
        file_name = file_name.as_deref().unwrap_or("-"),
        size = bytes.len(),
        "Processing upload"
    );

    let request = RecognizeRequest {
        language,
        file_name: file_name.clone(),
        content_type: file_content_type,
    };

    let result = match state.ocr.recognize(&bytes, &request).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(file_id = %file_id, error = %e, "OCR request failed");
            return e.into();
        }
    };

    let cleaning = clean_text.then(|| state.normalizer.clean(&result.text));

    ApiResponse::success(OcrResponse::new(
        file_id,
        result,
        cleaning,
        file_name,
        bytes.len(),
    ))
}
