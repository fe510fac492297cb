//! Vietnamese OCR text normalization.
//!
//! [`TextNormalizer`] turns noisy engine output into a consistent string:
//! NFC canonicalization, noise stripping, accent restoration for a fixed
//! vocabulary of identity-document terms (see [`phrases`]), and date / ID /
//! phone number normalization. It is a pure function of its input.

mod normalizer;
pub mod phrases;

pub use normalizer::{CleaningResult, CleaningStats, TextNormalizer};
