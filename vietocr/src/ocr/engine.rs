use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Failure of a single engine invocation. Recovered by the search loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine binary not found: {0}")]
    NotFound(String),

    #[error("engine call timed out after {0:?}")]
    Timeout(Duration),

    #[error("engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text produced by one engine call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    pub text: String,
    /// Mean word confidence (0-100) when the engine reports one.
    pub mean_confidence: Option<f32>,
}

/// An external OCR engine taking (image, language, layout mode).
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn recognize(
        &self,
        image_path: &Path,
        language: &str,
        psm: u8,
        timeout: Duration,
    ) -> Result<EngineOutput, EngineError>;
}

/// The `tesseract` command-line binary.
///
/// Runs `tesseract <image> stdout -l <lang> --psm <n> tsv` and rebuilds the
/// text from the TSV word rows so that native confidences come for free.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(
        &self,
        image_path: &Path,
        language: &str,
        psm: u8,
        timeout: Duration,
    ) -> Result<EngineOutput, EngineError> {
        let mut command = Command::new(&self.binary);
        command
            .arg(image_path)
            .arg("stdout")
            .args(["-l", language, "--psm", &psm.to_string(), "tsv"])
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Err(_) => return Err(EngineError::Timeout(timeout)),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::NotFound(self.binary.display().to_string()))
            }
            Ok(Err(e)) => return Err(EngineError::Io(e)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Rebuild plain text and mean confidence from Tesseract TSV output.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Only level-5 (word) rows carry text.
/// Words on the same line are joined by a space, lines by `\n`, and a blank
/// line separates paragraphs.
pub fn parse_tsv(tsv: &str) -> EngineOutput {
    let mut text = String::new();
    let mut confidences: Vec<f32> = Vec::new();
    let mut current_line: Option<(&str, &str, &str, &str)> = None;

    for row in tsv.lines() {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        let key = (cols[1], cols[2], cols[3], cols[4]);
        match current_line {
            Some(prev) if prev == key => text.push(' '),
            Some(prev) => {
                if (prev.0, prev.1, prev.2) != (key.0, key.1, key.2) {
                    text.push_str("\n\n");
                } else {
                    text.push('\n');
                }
            }
            None => {}
        }
        current_line = Some(key);
        text.push_str(word);

        if let Ok(conf) = cols[10].trim().parse::<f32>() {
            if conf >= 0.0 {
                confidences.push(conf);
            }
        }
    }

    let mean_confidence = if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
    };

    EngineOutput {
        text,
        mean_confidence,
    }
}
