//! vietocr: OCR for Vietnamese documents.
//!
//! The library holds everything the `vietocr` binary serves: the
//! [`text::TextNormalizer`] cleaning pipeline, the best-effort Tesseract
//! search in [`ocr`], and the axum [`api`] that exposes both.

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod ocr;
pub mod text;

pub use error::{Result, VietOcrError};
