//! Inference Probe
//!
//! Smoke-tests a classification model on a Triton server. The run is strictly
//! linear and fails fast:
//! health check -> acquire image -> preprocess -> infer -> rank -> report.

pub mod config;
pub mod report;

pub use config::{Cli, ProbeConfig};
pub use report::Report;

use std::io::{self, Write};
use std::time::Instant;
use tensor_prep::{build_source, PrepError};
use thiserror::Error;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use triton_client::{ClientError, TritonClient};

/// A failed probe stage. Every variant ends the run with a nonzero exit.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] ClientError),

    #[error("Health check failed: {0}")]
    Health(#[source] ClientError),

    #[error("Failed to download sample image: {0}")]
    Download(#[source] ClientError),

    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PrepError),

    #[error("Inference request error: {0}")]
    Inference(#[source] ClientError),

    #[error("Failed to process predictions: {0}")]
    Predictions(#[source] ClientError),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Initialize logging on stderr so stdout carries only the report
pub fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Run every stage in order, writing progress lines to `out`
pub async fn run(config: &ProbeConfig, out: &mut dyn Write) -> Result<Report, ProbeError> {
    writeln!(out, "🚀 Testing {} inference on Triton Server: {}", config.model, config.url)?;

    let client = TritonClient::new(config.client_config()).map_err(ProbeError::Client)?;

    // 1. Health check
    client.check_ready().await.map_err(ProbeError::Health)?;
    writeln!(out, "✅ Triton Server and {} model are ready", config.model)?;

    // 2. Acquire image; a local path is used as given
    let image = match &config.image {
        Some(path) => path.clone(),
        None => {
            let path = client
                .download(&config.sample_url, &config.sample_path)
                .await
                .map_err(ProbeError::Download)?;
            writeln!(out, "✅ Sample image downloaded: {}", path.display())?;
            path
        }
    };

    // 3. Preprocess
    let source = build_source(config.source, config.seed);
    info!(source = source.name(), image = %image.display(), "Preprocessing");
    let tensor = source.load(&image)?;
    writeln!(out, "✅ Image preprocessed: shape {}", tensor)?;

    // 4. Inference
    let start = Instant::now();
    let response = client.infer(&tensor).await.map_err(ProbeError::Inference)?;
    let latency_ms = start.elapsed().as_millis() as u64;
    writeln!(out, "✅ Inference request successful ({}ms)", latency_ms)?;

    // 5. Rank
    let predictions = response.top_k(config.top_k).map_err(ProbeError::Predictions)?;

    Ok(Report {
        url: config.url.clone(),
        model: config.model.clone(),
        image,
        source: config.source,
        top_k: config.top_k,
        request_id: response.id,
        latency_ms,
        predictions,
    })
}

/// Run the probe and print the report to stdout, as text or JSON
pub async fn run_cli(config: &ProbeConfig) -> Result<(), ProbeError> {
    let stdout = io::stdout();

    if config.json {
        let report = run(config, &mut io::sink()).await?;
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        let mut out = stdout.lock();
        let report = run(config, &mut out).await?;
        write!(out, "{}", report)?;
        writeln!(out, "\n✅ {} inference test completed successfully!", config.model)?;
    }

    Ok(())
}
