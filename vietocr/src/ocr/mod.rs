//! OCR (Optical Character Recognition) Module
//!
//! Extracts text from uploaded images and PDFs with the `tesseract` CLI.
//!
//! # Architecture
//!
//! - [`OcrEngine`] is the seam around one external engine call.
//!   [`TesseractCli`] implements it; tests substitute scripted engines.
//! - [`BestEffortSearch`] sweeps six preprocessing variants, the requested
//!   and fallback languages, and a list of page-segmentation modes, keeping
//!   the attempt that extracted the most characters.
//! - [`OcrProvider`] is chosen once at startup from the
//!   [`EngineCapabilities`] probe. Without an engine it answers with demo or
//!   empty text instead of failing.
//!
//! # Configuration
//!
//! See `OcrConfig`, `SearchConfig` and `PdfConfig` in `config.rs`:
//! - `OCR_DEFAULT_LANGUAGE` / `OCR_FALLBACK_LANGUAGE`: `vie` then `eng`
//! - `OCR_PSM_MODES`: page-segmentation modes, default `3,6,7,8`
//! - `OCR_EARLY_EXIT_CHARS`: stop the sweep once an attempt exceeds this
//! - `OCR_TIMEOUT` / `OCR_ATTEMPT_TIMEOUT`: request and per-call budgets
//!
//! # Usage
//!
//! ```rust,ignore
//! let caps = EngineCapabilities::probe(&config).await;
//! let ocr = OcrProvider::new(&config, caps);
//! let result = ocr.recognize(&bytes, &RecognizeRequest::default()).await?;
//! ```

mod capability;
mod engine;
mod pdf;
mod preprocessing;
mod provider;
mod search;
mod types;

pub use capability::{parse_language_list, parse_version, EngineCapabilities};
pub use engine::{parse_tsv, EngineError, EngineOutput, OcrEngine, TesseractCli};
pub use pdf::{is_pdf, PdfRasterizer};
pub use preprocessing::{decode_image, encode_png, ImageStats, PreprocessVariant};
pub use provider::{OcrProvider, RecognizeRequest, DEMO_TEXT};
pub use search::{summarize, BestEffortSearch, SearchOutcome, NO_TEXT_METHOD};
pub use types::{synthetic_confidence, ConfidenceSource, OcrAttempt, OcrResult};
