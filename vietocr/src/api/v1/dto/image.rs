//! Image enhancement DTOs for the v1 API.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::ocr::{ImageStats, PreprocessVariant};

/// Response body for `POST /v1/image:enhance`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceImageResponse {
    pub file_id: String,
    /// Name of the preprocessing variant that was applied.
    pub variant: String,
    pub original_width: u32,
    pub original_height: u32,
    /// Statistics of the enhanced image. Its size reflects any downscaling.
    pub image_stats: ImageStats,
    /// The enhanced image, PNG encoded as standard base64.
    pub image_png_base64: String,
    /// Seconds spent decoding and enhancing.
    pub processing_time: f64,
}

impl EnhanceImageResponse {
    pub fn new(
        file_id: String,
        variant: PreprocessVariant,
        original: (u32, u32),
        stats: ImageStats,
        png: &[u8],
        processing_time: f64,
    ) -> Self {
        Self {
            file_id,
            variant: variant.as_str().to_string(),
            original_width: original.0,
            original_height: original.1,
            image_stats: stats,
            image_png_base64: base64::engine::general_purpose::STANDARD.encode(png),
            processing_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_png_is_base64_encoded() {
        let stats = ImageStats {
            width: 2,
            height: 1,
            mean_intensity: 10.0,
            std_intensity: 0.0,
            contrast_ratio: 0.0,
        };
        let png = b"\x89PNG\r\n";
        let response = EnhanceImageResponse::new(
            "img_1".to_string(),
            PreprocessVariant::OtsuThreshold,
            (4, 2),
            stats,
            png,
            0.5,
        );

        assert_eq!(response.variant, "otsu_threshold");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&response.image_png_base64)
            .unwrap();
        assert_eq!(decoded, png.to_vec());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["originalWidth"], 4);
        assert_eq!(json["imageStats"]["meanIntensity"], 10.0);
    }
}
