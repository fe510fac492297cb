use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::{ApiResponse, ResponseMeta};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    /// Tesseract traineddata name, e.g. `vie`.
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LanguagesData {
    pub languages: Vec<LanguageInfo>,
    pub total: usize,
    pub vietnamese_supported: bool,
    pub english_supported: bool,
    pub default_language: String,
    pub fallback_language: String,
}

fn display_name(code: &str) -> &str {
    match code {
        "vie" => "Vietnamese",
        "eng" => "English",
        "fra" => "French",
        "chi_sim" => "Chinese (Simplified)",
        "chi_tra" => "Chinese (Traditional)",
        "jpn" => "Japanese",
        "kor" => "Korean",
        "tha" => "Thai",
        "khm" => "Khmer",
        "lao" => "Lao",
        other => other,
    }
}

/// `GET /api/v1/languages`
///
/// Lists the languages installed for the OCR engine, as found by the
/// startup probe. Empty when no engine is installed.
#[utoipa::path(
    get,
    path = "/api/v1/languages",
    tag = "ocr",
    operation_id = "languages.list",
    responses(
        (status = 200, description = "Installed OCR languages", body = LanguagesData),
    )
)]
pub async fn list_languages(State(state): State<AppState>) -> ApiResponse<LanguagesData> {
    let capabilities = state.ocr.capabilities();
    let installed = |code: &str| capabilities.languages.iter().any(|l| l == code);

    let languages: Vec<LanguageInfo> = capabilities
        .languages
        .iter()
        .map(|code| LanguageInfo {
            code: code.clone(),
            name: display_name(code).to_string(),
        })
        .collect();
    let total = languages.len();

    ApiResponse::success_with_meta(
        LanguagesData {
            total,
            vietnamese_supported: installed("vie"),
            english_supported: installed("eng"),
            default_language: state.config.ocr.default_language.clone(),
            fallback_language: state.config.ocr.fallback_language.clone(),
            languages,
        },
        ResponseMeta {
            total: Some(total as u64),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_known_and_unknown() {
        assert_eq!(display_name("vie"), "Vietnamese");
        assert_eq!(display_name("deu"), "deu");
    }
}
