//! Directory batch OCR for the `vietocr ocr --batch` command.
//!
//! Every supported file directly inside the input directory is recognized in
//! name order. Text lands in `<stem>.txt` under the output directory and a
//! `batch_summary_<timestamp>.json` records the outcome of each file. A file
//! that fails is recorded and the run moves on.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VietOcrError};
use crate::ocr::{OcrProvider, RecognizeRequest};
use crate::text::TextNormalizer;

/// Extensions picked up from the input directory, compared case-insensitively.
pub const BATCH_EXTENSIONS: [&str; 8] = ["pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Output subdirectory used when no output directory is given.
pub const DEFAULT_OUTPUT_DIR: &str = "ocr_results";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchFileResult {
    pub file_name: String,
    pub success: bool,
    /// Characters written to the text file.
    pub text_length: usize,
    pub confidence: f32,
    pub processing_method: String,
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub summary_path: PathBuf,
    pub total: usize,
    pub successful: usize,
    pub files: Vec<BatchFileResult>,
}

/// Recognize every supported file in `input_dir`.
///
/// `normalizer` is applied to each text before it is written; pass `None`
/// to keep raw engine output. `output_dir` defaults to
/// `<input_dir>/ocr_results` and is created when missing.
pub async fn process_directory(
    provider: &OcrProvider,
    normalizer: Option<&TextNormalizer>,
    input_dir: &Path,
    output_dir: Option<&Path>,
    language: Option<String>,
) -> Result<BatchSummary> {
    if !tokio::fs::metadata(input_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Err(VietOcrError::InvalidInput(format!(
            "Input directory not found: {}",
            input_dir.display()
        )));
    }

    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input_dir.join(DEFAULT_OUTPUT_DIR));
    tokio::fs::create_dir_all(&output_dir).await?;

    let inputs = collect_inputs(input_dir).await?;
    if inputs.is_empty() {
        tracing::warn!(dir = %input_dir.display(), "No supported files found");
    } else {
        tracing::info!(count = inputs.len(), "Found files to process");
    }

    let mut files = Vec::with_capacity(inputs.len());
    for (i, path) in inputs.iter().enumerate() {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!("Processing {}/{}: {}", i + 1, inputs.len(), file_name);

        let entry = match process_file(provider, normalizer, path, &output_dir, &language).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Batch file failed");
                BatchFileResult {
                    file_name: file_name.clone(),
                    success: false,
                    text_length: 0,
                    confidence: 0.0,
                    processing_method: String::new(),
                    output_path: None,
                    error: Some(e.to_string()),
                }
            }
        };
        files.push(entry);
    }

    let successful = files.iter().filter(|f| f.success).count();
    let summary_path = output_dir.join(format!(
        "batch_summary_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));
    let summary = BatchSummary {
        input_dir: input_dir.to_path_buf(),
        output_dir,
        summary_path: summary_path.clone(),
        total: files.len(),
        successful,
        files,
    };
    tokio::fs::write(&summary_path, serde_json::to_vec_pretty(&summary)?).await?;

    tracing::info!(
        successful,
        total = summary.total,
        summary = %summary_path.display(),
        "Batch processing completed"
    );
    Ok(summary)
}

async fn process_file(
    provider: &OcrProvider,
    normalizer: Option<&TextNormalizer>,
    path: &Path,
    output_dir: &Path,
    language: &Option<String>,
) -> Result<BatchFileResult> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let request = RecognizeRequest {
        language: language.clone(),
        file_name: Some(file_name.clone()),
        content_type: None,
    };
    let result = provider.recognize(&bytes, &request).await?;

    let text = match normalizer {
        Some(normalizer) => normalizer.clean(&result.text).cleaned_text,
        None => result.text,
    };

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());
    let output_path = output_dir.join(format!("{stem}.txt"));
    tokio::fs::write(&output_path, &text).await?;

    Ok(BatchFileResult {
        file_name,
        success: result.success,
        text_length: text.chars().count(),
        confidence: result.confidence,
        processing_method: result.method_label,
        output_path: Some(output_path),
        error: None,
    })
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            BATCH_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Supported regular files directly inside `dir`, sorted by name.
async fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut inputs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_supported(&path) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}
