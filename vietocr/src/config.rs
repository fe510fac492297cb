use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Page-segmentation modes tried by the best-effort search, in order:
/// automatic layout, single uniform block, single line, single word.
pub const DEFAULT_PSM_MODES: &[u8] = &[3, 6, 7, 8];

/// Parse `OCR_PSM_MODES`.
/// Format: comma-separated integers in `0..=13`, e.g. `3,6,7,8`.
fn parse_psm_modes() -> Vec<u8> {
    match env::var("OCR_PSM_MODES") {
        Ok(val) if !val.trim().is_empty() => {
            let modes: Vec<u8> = val
                .split(',')
                .filter_map(|raw| {
                    let raw = raw.trim();
                    match raw.parse::<u8>() {
                        Ok(mode) if mode <= 13 => Some(mode),
                        _ => {
                            tracing::warn!(
                                "Invalid page segmentation mode '{}' in OCR_PSM_MODES, skipping",
                                raw
                            );
                            None
                        }
                    }
                })
                .collect();

            if modes.is_empty() {
                DEFAULT_PSM_MODES.to_vec()
            } else {
                modes
            }
        }
        _ => DEFAULT_PSM_MODES.to_vec(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub search: SearchConfig,
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub tesseract_path: String,
    pub default_language: String,
    pub fallback_language: String,
    /// Budget for a whole request, across every engine invocation.
    pub timeout_secs: u64,
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
    /// Answer with canned Vietnamese text when the engine is missing.
    pub demo_mode: bool,
}

/// Knobs of the best-effort (variant x language x mode) sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub attempt_timeout_secs: u64,
    /// Stop the sweep as soon as one attempt yields more characters than this.
    pub early_exit_chars: usize,
    /// Best attempts shorter than this are reported as "no text found".
    pub min_viable_chars: usize,
    pub psm_modes: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    pub pdftoppm_path: String,
    pub dpi: u32,
    pub max_pages: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            default_language: "vie".to_string(),
            fallback_language: "eng".to_string(),
            timeout_secs: 120,
            max_image_dimension: 4096,
            min_image_dimension: 10,
            demo_mode: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: 8,
            early_exit_chars: 100,
            min_viable_chars: 2,
            psm_modes: DEFAULT_PSM_MODES.to_vec(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            pdftoppm_path: "pdftoppm".to_string(),
            dpi: 300,
            max_pages: 20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("VIETOCR_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("VIETOCR_PORT", 8001),
                max_upload_bytes: parse_env_or("VIETOCR_MAX_UPLOAD_BYTES", 50 * 1024 * 1024),
            },
            ocr: OcrConfig {
                tesseract_path: env::var("OCR_TESSERACT_PATH")
                    .unwrap_or_else(|_| "tesseract".to_string()),
                default_language: env::var("OCR_DEFAULT_LANGUAGE")
                    .unwrap_or_else(|_| "vie".to_string()),
                fallback_language: env::var("OCR_FALLBACK_LANGUAGE")
                    .unwrap_or_else(|_| "eng".to_string()),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 120),
                max_image_dimension: parse_env_or("OCR_MAX_DIMENSION", 4096),
                min_image_dimension: parse_env_or("OCR_MIN_DIMENSION", 10),
                demo_mode: parse_env_or("OCR_DEMO_MODE", true),
            },
            search: SearchConfig {
                attempt_timeout_secs: parse_env_or("OCR_ATTEMPT_TIMEOUT", 8),
                early_exit_chars: parse_env_or("OCR_EARLY_EXIT_CHARS", 100),
                min_viable_chars: parse_env_or("OCR_MIN_VIABLE_CHARS", 2),
                psm_modes: parse_psm_modes(),
            },
            pdf: PdfConfig {
                pdftoppm_path: env::var("OCR_PDFTOPPM_PATH")
                    .unwrap_or_else(|_| "pdftoppm".to_string()),
                dpi: parse_env_or("OCR_PDF_DPI", 300),
                max_pages: parse_env_or("OCR_MAX_PDF_PAGES", 20),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
