use crate::config::OcrConfig;
use crate::error::{Result, VietOcrError};
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, ImageReader, Luma};
use imageproc::contrast::{adaptive_threshold, equalize_histogram, otsu_level};
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{grayscale_close, Mask};
use serde::{Deserialize, Serialize};

/// Block radius for local (adaptive) thresholding, in pixels.
const ADAPTIVE_BLOCK_RADIUS: u32 = 5;

/// One image transformation tried by the best-effort search.
///
/// The order of [`PreprocessVariant::ALL`] is the order the search visits
/// them in, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessVariant {
    /// Grayscale only.
    Original,
    /// Histogram equalization, light Gaussian blur, then Otsu binarization.
    EqualizeBlurOtsu,
    OtsuThreshold,
    AdaptiveThreshold,
    EqualizeHistogram,
    /// Grayscale morphological closing with a 2x2 square. Bridges broken strokes.
    MorphologicalClose,
}

impl PreprocessVariant {
    pub const ALL: [PreprocessVariant; 6] = [
        PreprocessVariant::Original,
        PreprocessVariant::EqualizeBlurOtsu,
        PreprocessVariant::OtsuThreshold,
        PreprocessVariant::AdaptiveThreshold,
        PreprocessVariant::EqualizeHistogram,
        PreprocessVariant::MorphologicalClose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreprocessVariant::Original => "original",
            PreprocessVariant::EqualizeBlurOtsu => "equalize_blur_otsu",
            PreprocessVariant::OtsuThreshold => "otsu_threshold",
            PreprocessVariant::AdaptiveThreshold => "adaptive_threshold",
            PreprocessVariant::EqualizeHistogram => "equalize_histogram",
            PreprocessVariant::MorphologicalClose => "morphological_close",
        }
    }

    /// Render this variant as a single-channel image.
    pub fn apply(&self, img: &DynamicImage) -> GrayImage {
        let gray = img.to_luma8();
        match self {
            PreprocessVariant::Original => gray,
            PreprocessVariant::EqualizeBlurOtsu => {
                let blurred = gaussian_blur_f32(&equalize_histogram(&gray), 0.8);
                binarize_otsu(&blurred)
            }
            PreprocessVariant::OtsuThreshold => binarize_otsu(&gray),
            PreprocessVariant::AdaptiveThreshold => adaptive_threshold(&gray, ADAPTIVE_BLOCK_RADIUS),
            PreprocessVariant::EqualizeHistogram => equalize_histogram(&gray),
            PreprocessVariant::MorphologicalClose => grayscale_close(&gray, &close_mask()),
        }
    }
}

impl std::str::FromStr for PreprocessVariant {
    type Err = VietOcrError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        PreprocessVariant::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                let known: Vec<&str> = PreprocessVariant::ALL.iter().map(|v| v.as_str()).collect();
                VietOcrError::InvalidInput(format!(
                    "Unknown preprocessing variant '{name}', expected one of: {}",
                    known.join(", ")
                ))
            })
    }
}

/// Intensity statistics of a rendered variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageStats {
    pub width: u32,
    pub height: u32,
    pub mean_intensity: f64,
    pub std_intensity: f64,
    /// `std / mean`, zero for an all-black image.
    pub contrast_ratio: f64,
}

impl ImageStats {
    pub fn of(img: &GrayImage) -> Self {
        let count = (img.width() as f64 * img.height() as f64).max(1.0);
        let mean = img.pixels().map(|p| p[0] as f64).sum::<f64>() / count;
        let variance = img
            .pixels()
            .map(|p| (p[0] as f64 - mean).powi(2))
            .sum::<f64>()
            / count;
        let std = variance.sqrt();

        Self {
            width: img.width(),
            height: img.height(),
            mean_intensity: mean,
            std_intensity: std,
            contrast_ratio: if mean > 0.0 { std / mean } else { 0.0 },
        }
    }
}

/// 2x2 square anchored at its lower-right cell, bridging one-pixel breaks
/// in strokes without thickening them much.
fn close_mask() -> Mask {
    Mask::from_image(&GrayImage::from_pixel(2, 2, Luma([255u8])), 1, 1)
}

impl std::fmt::Display for PreprocessVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode uploaded bytes into an image ready for the variant sweep.
///
/// Rejects undecodable data and images below `min_image_dimension` on
/// either side, then downsizes anything above `max_image_dimension`.
pub fn decode_image(bytes: &[u8], config: &OcrConfig) -> Result<DynamicImage> {
    let reader = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| VietOcrError::InvalidInput(format!("Failed to read image: {e}")))?;

    let img = reader
        .decode()
        .map_err(|e| VietOcrError::InvalidInput(format!("Failed to decode image: {e}")))?;

    let (width, height) = img.dimensions();
    if width < config.min_image_dimension || height < config.min_image_dimension {
        return Err(VietOcrError::InvalidInput(format!(
            "Image too small: {}x{}, minimum {}x{}",
            width, height, config.min_image_dimension, config.min_image_dimension
        )));
    }

    Ok(resize_if_needed(img, config.max_image_dimension))
}

/// Encode a rendered variant as PNG, the format handed to the engine.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

/// Resize image if it exceeds maximum dimension while maintaining aspect ratio
fn resize_if_needed(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dim && height <= max_dim {
        return img;
    }

    let ratio = max_dim as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

fn binarize_otsu(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
