mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::{document_image, init_test_logger, test_config, FakeEngine, Reply};
use vietocr::ocr::{
    summarize, BestEffortSearch, ConfidenceSource, OcrEngine, NO_TEXT_METHOD,
};

fn search(engine: Arc<FakeEngine>, psm_modes: &[u8]) -> BestEffortSearch {
    let engine: Arc<dyn OcrEngine> = engine;
    BestEffortSearch::new(engine, test_config(psm_modes).search)
}

fn languages() -> Vec<String> {
    BestEffortSearch::languages("vie", "eng")
}

#[tokio::test]
async fn test_full_sweep_stays_within_bound() {
    init_test_logger();
    let engine = FakeEngine::text("ab");
    let search = search(engine.clone(), &[3, 6, 7, 8]);
    let workdir = TempDir::new().unwrap();

    let outcome = search
        .run(Arc::new(document_image(120, 80)), &languages(), workdir.path())
        .await
        .unwrap();

    assert_eq!(search.max_attempts(2), 48);
    assert_eq!(outcome.attempts, 48);
    assert_eq!(engine.calls(), 48);
    assert_eq!(outcome.failures, 0);
    assert!(!outcome.early_exit);
    assert_eq!(outcome.best.as_ref().map(|b| b.text.as_str()), Some("ab"));
}

#[tokio::test]
async fn test_long_first_attempt_ends_sweep() {
    let engine = FakeEngine::new(Reply::Text("Số ".repeat(60), Some(91.0)));
    let search = search(engine.clone(), &[3, 6, 7, 8]);
    let workdir = TempDir::new().unwrap();

    let outcome = search
        .run(Arc::new(document_image(120, 80)), &languages(), workdir.path())
        .await
        .unwrap();

    assert!(outcome.early_exit);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(engine.calls(), 1);

    let result = summarize(&[outcome], 2, "vie", Duration::from_millis(5));
    assert_eq!(result.method_label, "tesseract_original_vie_psm3");
    assert_eq!(result.confidence_source, ConfidenceSource::Engine);
    assert_eq!(result.confidence, 91.0);
    assert!(result.early_exit);
}

#[tokio::test]
async fn test_longest_attempt_is_reported() {
    let engine = FakeEngine::new(Reply::Growing);
    let search = search(engine.clone(), &[3, 6, 7, 8]);
    let workdir = TempDir::new().unwrap();

    let outcome = search
        .run(Arc::new(document_image(120, 80)), &languages(), workdir.path())
        .await
        .unwrap();
    let result = summarize(&[outcome], 2, "vie", Duration::ZERO);

    assert_eq!(result.text.len(), 48);
    assert_eq!(result.method_label, "tesseract_morphological_close_eng_psm8");
    assert_eq!(result.preprocessing, "morphological_close");
    assert_eq!(result.language, "eng");
    assert_eq!(result.confidence_source, ConfidenceSource::Synthetic);
    assert_eq!(result.confidence, 74.0);
}

#[tokio::test]
async fn test_failing_engine_yields_empty_success() {
    let engine = FakeEngine::new(Reply::Fail);
    let search = search(engine.clone(), &[3, 6]);
    let workdir = TempDir::new().unwrap();

    let outcome = search
        .run(Arc::new(document_image(64, 48)), &languages(), workdir.path())
        .await
        .unwrap();

    assert!(outcome.best.is_none());
    assert_eq!(outcome.attempts, 24);
    assert_eq!(outcome.failures, 24);

    let result = summarize(&[outcome], 2, "vie", Duration::ZERO);
    assert!(result.success);
    assert_eq!(result.text, "");
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.method_label, NO_TEXT_METHOD);
    assert_eq!(result.preprocessing, "none");
    assert_eq!(result.language, "vie");
}

#[tokio::test]
async fn test_scratch_files_are_removed_after_sweep() {
    let engine = FakeEngine::text("Hà Nội");
    let search = search(engine, &[3]);
    let workdir = TempDir::new().unwrap();

    search
        .run(Arc::new(document_image(64, 48)), &languages(), workdir.path())
        .await
        .unwrap();

    let leftovers = std::fs::read_dir(workdir.path()).unwrap().count();
    assert_eq!(leftovers, 0);
}
