use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;

use crate::config::Config;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// What the host can do, probed once at startup.
///
/// A tesseract crash later on does not flip `installed`; it only costs the
/// attempt that crashed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineCapabilities {
    pub installed: bool,
    pub version: Option<String>,
    /// Installed traineddata names, `osd` excluded.
    pub languages: Vec<String>,
    /// `pdftoppm` is available for rasterizing PDF uploads.
    pub pdf_support: bool,
}

impl EngineCapabilities {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub async fn probe(config: &Config) -> Self {
        let tesseract = Path::new(&config.ocr.tesseract_path);

        let version = match run_probe(tesseract, &["--version"]).await {
            Some(output) => parse_version(&output),
            None => {
                tracing::warn!(
                    "tesseract not found at '{}', OCR will run in fallback mode",
                    config.ocr.tesseract_path
                );
                return Self {
                    pdf_support: probe_pdftoppm(&config.pdf.pdftoppm_path).await,
                    ..Self::unavailable()
                };
            }
        };

        let languages = run_probe(tesseract, &["--list-langs"])
            .await
            .map(|output| parse_language_list(&output))
            .unwrap_or_default();

        let pdf_support = probe_pdftoppm(&config.pdf.pdftoppm_path).await;

        tracing::info!(
            version = version.as_deref().unwrap_or("unknown"),
            languages = ?languages,
            pdf_support,
            "Tesseract detected"
        );

        Self {
            installed: true,
            version,
            languages,
            pdf_support,
        }
    }

    /// An empty language list means the probe could not tell, so anything goes.
    pub fn supports_language(&self, language: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|l| l == language)
    }
}

async fn probe_pdftoppm(path: &str) -> bool {
    let available = run_probe(Path::new(path), &["-v"]).await.is_some();
    if !available {
        tracing::warn!("pdftoppm not found at '{}', PDF uploads are disabled", path);
    }
    available
}

/// Run a probe command, returning stdout and stderr concatenated on success.
/// Tesseract 3.x prints its version and language list to stderr.
async fn run_probe(binary: &Path, args: &[&str]) -> Option<String> {
    let mut command = Command::new(binary);
    command.args(args).kill_on_drop(true);

    match tokio::time::timeout(PROBE_TIMEOUT, command.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push('\n');
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            Some(text)
        }
        Ok(Ok(output)) => {
            tracing::debug!(
                "{} {:?} exited with {}",
                binary.display(),
                args,
                output.status
            );
            None
        }
        Ok(Err(e)) => {
            tracing::debug!("{} {:?} failed: {}", binary.display(), args, e);
            None
        }
        Err(_) => {
            tracing::debug!("{} {:?} timed out", binary.display(), args);
            None
        }
    }
}

/// Extract the version from `tesseract --version` output, e.g. `tesseract 5.3.0`.
pub fn parse_version(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("tesseract "))
        .map(|rest| rest.trim().trim_start_matches('v').to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `tesseract --list-langs` output.
pub fn parse_language_list(output: &str) -> Vec<String> {
    let mut languages: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("List of available languages"))
        .filter(|line| !line.contains(char::is_whitespace))
        .filter(|line| *line != "osd")
        .map(str::to_string)
        .collect();
    languages.sort();
    languages.dedup();
    languages
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_version() {
        let output = "tesseract 5.3.0\n leptonica-1.82.0\n  libgif 5.2.1 : libjpeg 8d\n";
        assert_eq!(parse_version(output), Some("5.3.0".to_string()));
        assert_eq!(parse_version("tesseract v4.1.1\n"), Some("4.1.1".to_string()));
        assert_eq!(parse_version("garbage"), None);
    }

    #[test]
    fn test_parse_language_list() {
        let output = "List of available languages in \"/usr/share/tesseract-ocr/5/tessdata/\" (3):\neng\nosd\nvie\n";
        assert_eq!(parse_language_list(output), vec!["eng", "vie"]);
    }

    #[test]
    fn test_parse_language_list_empty() {
        assert!(parse_language_list("List of available languages (0):\n").is_empty());
    }

    #[test]
    fn test_supports_language() {
        let caps = EngineCapabilities {
            installed: true,
            languages: vec!["eng".into(), "vie".into()],
            ..Default::default()
        };
        assert!(caps.supports_language("vie"));
        assert!(!caps.supports_language("fra"));

        let unknown = EngineCapabilities {
            installed: true,
            ..Default::default()
        };
        assert!(unknown.supports_language("fra"));
    }

    #[tokio::test]
    async fn test_probe_missing_binaries() {
        let mut config = Config::default();
        config.ocr.tesseract_path = "/nonexistent/vietocr-tesseract".to_string();
        config.pdf.pdftoppm_path = "/nonexistent/vietocr-pdftoppm".to_string();

        let caps = EngineCapabilities::probe(&config).await;
        assert_eq!(caps, EngineCapabilities::unavailable());
    }
}
