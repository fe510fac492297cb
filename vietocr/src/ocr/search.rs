use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;

use super::engine::OcrEngine;
use super::preprocessing::{encode_png, PreprocessVariant};
use super::types::{synthetic_confidence, ConfidenceSource, OcrAttempt, OcrResult};
use crate::config::SearchConfig;
use crate::error::{Result, VietOcrError};

pub const NO_TEXT_METHOD: &str = "tesseract_no_text_found";

/// What one sweep over a single image produced.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Longest attempt seen, if any attempt returned non-empty text.
    pub best: Option<OcrAttempt>,
    pub attempts: usize,
    pub failures: usize,
    pub early_exit: bool,
    /// The request budget ran out before the sweep finished.
    pub deadline_reached: bool,
}

/// Sweeps (variant x language x page-segmentation mode) against an engine
/// and keeps the attempt with the most extracted characters.
///
/// Variants are the outer loop, then languages, then modes. The whole sweep
/// stops as soon as one attempt clears `early_exit_chars`, or when the
/// caller's deadline passes. Engine failures and hung calls are counted and
/// skipped, never propagated.
#[derive(Clone)]
pub struct BestEffortSearch {
    engine: Arc<dyn OcrEngine>,
    config: SearchConfig,
}

impl BestEffortSearch {
    pub fn new(engine: Arc<dyn OcrEngine>, config: SearchConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Requested language first, then the fallback unless they are equal.
    pub fn languages(requested: &str, fallback: &str) -> Vec<String> {
        let mut languages = vec![requested.to_string()];
        if fallback != requested && !fallback.is_empty() {
            languages.push(fallback.to_string());
        }
        languages
    }

    /// Upper bound on engine invocations for one image.
    pub fn max_attempts(&self, language_count: usize) -> usize {
        PreprocessVariant::ALL.len() * language_count * self.config.psm_modes.len()
    }

    pub async fn run(
        &self,
        image: Arc<DynamicImage>,
        languages: &[String],
        workdir: &Path,
    ) -> Result<SearchOutcome> {
        self.sweep(image, languages, workdir, None).await
    }

    /// Like [`run`](Self::run), but stops once `deadline` passes and keeps
    /// whatever the finished attempts produced.
    pub async fn run_until(
        &self,
        image: Arc<DynamicImage>,
        languages: &[String],
        workdir: &Path,
        deadline: Instant,
    ) -> Result<SearchOutcome> {
        self.sweep(image, languages, workdir, Some(deadline)).await
    }

    async fn sweep(
        &self,
        image: Arc<DynamicImage>,
        languages: &[String],
        workdir: &Path,
        deadline: Option<Instant>,
    ) -> Result<SearchOutcome> {
        let sweep_dir = tempfile::Builder::new()
            .prefix("sweep-")
            .tempdir_in(workdir)?;
        let attempt_timeout = Duration::from_secs(self.config.attempt_timeout_secs);

        let mut outcome = SearchOutcome::default();
        let mut best_len = 0usize;

        let remaining = || deadline.map(|d| d.saturating_duration_since(Instant::now()));
        let expired = || remaining().is_some_and(|left| left.is_zero());

        'sweep: for variant in PreprocessVariant::ALL {
            if expired() {
                outcome.deadline_reached = true;
                break 'sweep;
            }
            let rendered = match render_variant(variant, image.clone(), sweep_dir.path()).await {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(%variant, "Skipping preprocessing variant: {}", e);
                    continue;
                }
            };

            for language in languages {
                for &psm in &self.config.psm_modes {
                    if expired() {
                        outcome.deadline_reached = true;
                        break 'sweep;
                    }
                    let call_timeout =
                        remaining().map_or(attempt_timeout, |left| left.min(attempt_timeout));

                    outcome.attempts += 1;
                    let call = self
                        .engine
                        .recognize(&rendered, language, psm, call_timeout);
                    let output = match tokio::time::timeout(call_timeout, call).await {
                        Ok(Ok(output)) => output,
                        Err(_) => {
                            outcome.failures += 1;
                            tracing::debug!(
                                %variant,
                                language = %language,
                                psm,
                                "OCR attempt exceeded {:?}",
                                call_timeout
                            );
                            continue;
                        }
                        Ok(Err(e)) => {
                            outcome.failures += 1;
                            tracing::debug!(
                                %variant,
                                language = %language,
                                psm,
                                "OCR attempt failed: {}",
                                e
                            );
                            continue;
                        }
                    };

                    let text = output.text.trim();
                    let text_length = text.chars().count();
                    tracing::debug!(%variant, language = %language, psm, text_length, "OCR attempt");

                    if text_length > best_len {
                        best_len = text_length;
                        outcome.best = Some(OcrAttempt {
                            variant,
                            language: language.clone(),
                            psm,
                            text: text.to_string(),
                            text_length,
                            engine_confidence: output.mean_confidence,
                        });
                    }

                    if text_length > self.config.early_exit_chars {
                        outcome.early_exit = true;
                        break 'sweep;
                    }
                }
            }
        }

        tracing::debug!(
            attempts = outcome.attempts,
            failures = outcome.failures,
            early_exit = outcome.early_exit,
            deadline_reached = outcome.deadline_reached,
            best_len,
            "Search finished"
        );
        Ok(outcome)
    }
}

/// Render a variant off the async runtime and write it as PNG.
async fn render_variant(
    variant: PreprocessVariant,
    image: Arc<DynamicImage>,
    dir: &Path,
) -> Result<PathBuf> {
    let png = tokio::task::spawn_blocking(move || encode_png(&variant.apply(&image)))
        .await
        .map_err(|e| VietOcrError::Internal(format!("Preprocessing task failed: {e}")))??;

    let path = dir.join(format!("{}.png", variant.as_str()));
    tokio::fs::write(&path, png).await?;
    Ok(path)
}

/// Fold per-page outcomes into one result.
///
/// Pages whose best attempt is shorter than `min_viable_chars` contribute
/// nothing. Texts are joined with a blank line; confidence is the mean over
/// contributing pages, engine-reported where every page has one.
pub fn summarize(
    pages: &[SearchOutcome],
    min_viable_chars: usize,
    requested_language: &str,
    elapsed: Duration,
) -> OcrResult {
    let attempts = pages.iter().map(|p| p.attempts).sum();
    let failed_attempts = pages.iter().map(|p| p.failures).sum();
    let early_exit = pages.iter().any(|p| p.early_exit);
    let deadline_reached = pages.iter().any(|p| p.deadline_reached);
    let page_count = pages.len() as u32;

    let viable: Vec<&OcrAttempt> = pages
        .iter()
        .filter_map(|p| p.best.as_ref())
        .filter(|a| a.text_length >= min_viable_chars.max(1))
        .collect();

    let Some(lead) = viable.iter().max_by_key(|a| a.text_length) else {
        return OcrResult {
            success: true,
            text: String::new(),
            confidence: 0.0,
            confidence_source: ConfidenceSource::None,
            method_label: NO_TEXT_METHOD.to_string(),
            preprocessing: "none".to_string(),
            language: requested_language.to_string(),
            processing_time_seconds: elapsed.as_secs_f64(),
            attempts,
            failed_attempts,
            early_exit,
            deadline_reached,
            page_count,
            engine_available: true,
        };
    };

    let all_native = viable.iter().all(|a| a.engine_confidence.is_some());
    let confidence = viable
        .iter()
        .map(|a| match a.engine_confidence {
            Some(conf) if all_native => conf,
            _ => synthetic_confidence(a.text_length),
        })
        .sum::<f32>()
        / viable.len() as f32;

    let text = viable
        .iter()
        .map(|a| a.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    OcrResult {
        success: true,
        text,
        confidence: confidence.clamp(0.0, 100.0),
        confidence_source: if all_native {
            ConfidenceSource::Engine
        } else {
            ConfidenceSource::Synthetic
        },
        method_label: lead.method_label(),
        preprocessing: lead.variant.as_str().to_string(),
        language: lead.language.clone(),
        processing_time_seconds: elapsed.as_secs_f64(),
        attempts,
        failed_attempts,
        early_exit,
        deadline_reached,
        page_count,
        engine_available: true,
    }
}
