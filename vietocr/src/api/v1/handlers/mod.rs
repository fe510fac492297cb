pub(crate) mod health;
pub mod image;
pub mod languages;
pub mod ocr;
pub mod text;

pub use health::health_check;
