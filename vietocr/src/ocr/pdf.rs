use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use crate::config::PdfConfig;
use crate::error::{Result, VietOcrError};

const PDF_MIME: &str = "application/pdf";

/// Decide whether an upload is a PDF.
///
/// Magic bytes win. The declared content type and file extension are only
/// consulted when the bytes match no known format.
pub fn is_pdf(bytes: &[u8], file_name: Option<&str>, content_type: Option<&str>) -> bool {
    match infer::get(bytes) {
        Some(kind) => kind.mime_type() == PDF_MIME,
        None => {
            content_type.is_some_and(|ct| ct.eq_ignore_ascii_case(PDF_MIME))
                || file_name.is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"))
        }
    }
}

/// Renders PDF pages to PNG files with `pdftoppm` (poppler-utils).
#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    binary: PathBuf,
    dpi: u32,
    max_pages: u32,
}

impl PdfRasterizer {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            binary: PathBuf::from(&config.pdftoppm_path),
            dpi: config.dpi,
            max_pages: config.max_pages.max(1),
        }
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Write `bytes` into `workdir` and rasterize up to `max_pages` pages.
    ///
    /// Returns page images in page order.
    pub async fn rasterize(
        &self,
        bytes: &[u8],
        workdir: &Path,
        timeout: Duration,
    ) -> Result<Vec<PathBuf>> {
        let input = workdir.join("upload.pdf");
        tokio::fs::write(&input, bytes).await?;

        let output_prefix = workdir.join("page");
        let mut command = Command::new(&self.binary);
        command
            .args(["-png", "-r", &self.dpi.to_string()])
            .args(["-f", "1", "-l", &self.max_pages.to_string()])
            .arg(&input)
            .arg(&output_prefix)
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Err(_) => {
                return Err(VietOcrError::Ocr(format!(
                    "pdftoppm timed out after {}s",
                    timeout.as_secs()
                )))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VietOcrError::OcrUnavailable(
                    "pdftoppm not found (install poppler-utils)".to_string(),
                ))
            }
            Ok(Err(e)) => return Err(VietOcrError::Io(e)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VietOcrError::InvalidInput(format!(
                "Failed to rasterize PDF: {}",
                stderr.trim()
            )));
        }

        let pages = collect_page_images(workdir).await?;
        if pages.is_empty() {
            return Err(VietOcrError::InvalidInput(
                "PDF produced no pages".to_string(),
            ));
        }

        tracing::debug!(pages = pages.len(), dpi = self.dpi, "Rasterized PDF");
        Ok(pages)
    }
}

/// Find `page-N.png` files and sort them numerically.
///
/// pdftoppm zero-pads to the width of the page count, so `page-2.png`,
/// `page-02.png` and `page-002.png` can all occur.
async fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(number) = page_number(&path) {
            pages.push((number, path));
        }
    }

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("page-")?
        .parse()
        .ok()
}
