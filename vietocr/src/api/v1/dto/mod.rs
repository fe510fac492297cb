pub mod image;
pub mod ocr;
pub mod text;

pub use image::EnhanceImageResponse;
pub use ocr::{CleaningSummary, OcrMetadata, OcrResponse};
pub use text::CleanTextRequest;
