use axum::{
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;

pub fn v1_router() -> Router<AppState> {
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let ocr_routes = Router::new()
        .route("/languages", get(handlers::languages::list_languages))
        .route("/ocr:process", post(handlers::ocr::process_ocr))
        .route("/text:clean", post(handlers::text::clean_text))
        .route("/image:enhance", post(handlers::image::enhance_image));

    Router::new().merge(public_routes).merge(ocr_routes)
}
