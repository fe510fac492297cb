use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nanoid::nanoid;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vietocr::api::v1::dto::OcrResponse;
use vietocr::api::{create_router, AppState};
use vietocr::batch;
use vietocr::config::Config;
use vietocr::ocr::{EngineCapabilities, OcrProvider, RecognizeRequest};
use vietocr::text::TextNormalizer;

#[derive(Parser)]
#[command(name = "vietocr")]
#[command(version)]
#[command(about = "Self-hostable OCR service for Vietnamese documents")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Overrides VIETOCR_HOST
        #[arg(long)]
        host: Option<String>,
        /// Overrides VIETOCR_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Normalize Vietnamese OCR text and print the result as JSON
    Clean {
        /// Text to clean; read from stdin when omitted
        #[arg(long)]
        text: Option<String>,
    },
    /// Run OCR on a single image or PDF, or on a directory with --batch
    Ocr {
        #[arg(required_unless_present = "batch", conflicts_with = "batch")]
        path: Option<PathBuf>,
        /// Recognize every image and PDF in this directory
        #[arg(long)]
        batch: Option<PathBuf>,
        /// Where batch text files go; defaults to <batch>/ocr_results
        #[arg(long, requires = "batch")]
        output: Option<PathBuf>,
        /// Engine language code, e.g. `vie`
        #[arg(long)]
        language: Option<String>,
        /// Skip text normalization
        #[arg(long)]
        no_clean: bool,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vietocr=info,tower_http=debug".into());
    let json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();

    match args.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Clean { text } => clean(text).await,
        Command::Ocr {
            path,
            batch,
            output,
            language,
            no_clean,
        } => match (batch, path) {
            (Some(dir), _) => ocr_batch(config, dir, output, language, !no_clean).await,
            (None, Some(path)) => ocr_file(config, path, language, !no_clean).await,
            (None, None) => anyhow::bail!("either a file path or --batch <dir> is required"),
        },
    }
}

async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Probing OCR engine: {}...", config.ocr.tesseract_path);
    let capabilities = EngineCapabilities::probe(&config).await;
    let ocr = OcrProvider::new(&config, capabilities);
    if !ocr.is_available() {
        if config.ocr.demo_mode {
            tracing::warn!("OCR unavailable - serving demo text (OCR_DEMO_MODE=true)");
        } else {
            tracing::warn!("OCR unavailable - uploads will return empty text");
        }
    }

    let normalizer = TextNormalizer::new()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, ocr, normalizer);
    let app = create_router(state);

    tracing::info!("vietocr starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel_token.cancelled_owned())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn clean(text: Option<String>) -> anyhow::Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    let result = TextNormalizer::new()?.clean(&text);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn ocr_file(
    config: Config,
    path: PathBuf,
    language: Option<String>,
    clean_text: bool,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let capabilities = EngineCapabilities::probe(&config).await;
    let ocr = OcrProvider::new(&config, capabilities);

    let request = RecognizeRequest {
        language,
        file_name: file_name.clone(),
        content_type: None,
    };
    let result = ocr.recognize(&bytes, &request).await?;

    let cleaning = if clean_text {
        Some(TextNormalizer::new()?.clean(&result.text))
    } else {
        None
    };

    let response = OcrResponse::new(
        format!("ocr_{}", nanoid!()),
        result,
        cleaning,
        file_name,
        bytes.len(),
    );
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn ocr_batch(
    config: Config,
    dir: PathBuf,
    output: Option<PathBuf>,
    language: Option<String>,
    clean_text: bool,
) -> anyhow::Result<()> {
    let capabilities = EngineCapabilities::probe(&config).await;
    let ocr = OcrProvider::new(&config, capabilities);
    let normalizer = if clean_text {
        Some(TextNormalizer::new()?)
    } else {
        None
    };

    let summary = batch::process_directory(
        &ocr,
        normalizer.as_ref(),
        &dir,
        output.as_deref(),
        language,
    )
    .await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
    cancel_token.cancel();
}
