//! v1 image enhancement handler.
//!
//! Runs one preprocessing variant over an uploaded image and returns the
//! result, so callers can inspect what the OCR search sees. Needs no engine.

use std::time::Instant;

use axum::extract::{Multipart, State};
use image::GenericImageView;
use nanoid::nanoid;

use crate::api::v1::dto::EnhanceImageResponse;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::config::OcrConfig;
use crate::error::{Result, VietOcrError};
use crate::ocr::{decode_image, encode_png, ImageStats, PreprocessVariant};

const DEFAULT_VARIANT: PreprocessVariant = PreprocessVariant::EqualizeHistogram;

/// `POST /api/v1/image:enhance`
///
/// Multipart fields: `file` (required, image) and `variant` (one of the
/// preprocessing variant names, default `equalize_histogram`).
#[utoipa::path(
    post,
    path = "/api/v1/image:enhance",
    tag = "image",
    operation_id = "image.enhance",
    request_body(content_type = "multipart/form-data", content = String, description = "Image upload with an optional variant field"),
    responses(
        (status = 200, description = "Enhanced image as base64 PNG", body = EnhanceImageResponse),
        (status = 400, description = "Missing or unreadable image, or unknown variant", body = ApiError),
    )
)]
pub async fn enhance_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResponse<EnhanceImageResponse> {
    let max_bytes = state.config.server.max_upload_bytes;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut variant = DEFAULT_VARIANT;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
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
            "variant" => {
                let raw = match field.text().await {
                    Ok(t) => t,
                    Err(e) => {
                        return ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            format!("Invalid variant: {e}"),
                        );
                    }
                };
                if raw.trim().is_empty() {
                    continue;
                }
                variant = match raw.parse::<PreprocessVariant>() {
                    Ok(v) => v,
                    Err(e) => return e.into(),
                };
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

    let file_id = format!("img_{}", nanoid!());
    let started = Instant::now();
    let config = state.config.ocr.clone();

    let rendered = tokio::task::spawn_blocking(move || enhance(&bytes, &config, variant))
        .await
        .map_err(|e| VietOcrError::Internal(format!("Image enhancement task failed: {e}")))
        .and_then(|r| r);

    let (original, stats, png) = match rendered {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(file_id = %file_id, error = %e, "Image enhancement failed");
            return e.into();
        }
    };

    tracing::info!(
        file_id = %file_id,
        variant = variant.as_str(),
        width = stats.width,
        height = stats.height,
        "Enhanced image"
    );

    ApiResponse::success(EnhanceImageResponse::new(
        file_id,
        variant,
        original,
        stats,
        &png,
        started.elapsed().as_secs_f64(),
    ))
}

fn enhance(
    bytes: &[u8],
    config: &OcrConfig,
    variant: PreprocessVariant,
) -> Result<((u32, u32), ImageStats, Vec<u8>)> {
    let original = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|r| r.into_dimensions().ok());
    let img = decode_image(bytes, config)?;
    let rendered = variant.apply(&img);
    let stats = ImageStats::of(&rendered);
    let png = encode_png(&rendered)?;
    Ok((original.unwrap_or_else(|| img.dimensions()), stats, png))
}
