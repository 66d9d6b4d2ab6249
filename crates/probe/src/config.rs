//! Probe configuration
//!
//! Layered as: defaults, optional TOML/YAML/JSON file, `PROBE_*` environment
//! variables, then command-line flags.

use crate::ProbeError;
use clap::Parser;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tensor_prep::SourceKind;
use tracing::Level;
use triton_client::ClientConfig;

/// Public sample used when no `--image` is given
pub const DEFAULT_SAMPLE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/thumb/4/47/American_Eskimo_Dog.jpg/320px-American_Eskimo_Dog.jpg";

/// Smoke-test image classification inference on a Triton server
#[derive(Parser, Debug, Default)]
#[command(name = "inference-probe", version, about)]
pub struct Cli {
    /// Triton Server URL [default: http://localhost:8000]
    #[arg(long)]
    pub url: Option<String>,

    /// Path to image file [default: download sample]
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Number of top predictions to show [default: 5]
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Model name on the server [default: resnet50]
    #[arg(long)]
    pub model: Option<String>,

    /// Output tensor to request [default: resnetv17_dense0_fwd]
    #[arg(long)]
    pub output_name: Option<String>,

    /// Tensor source: synthetic (random pixels) or decode (read the image)
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<SourceKind>,

    /// Seed for the synthetic source
    #[arg(long)]
    pub seed: Option<u64>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the ranking as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Server base URL
    pub url: String,
    pub model: String,
    pub input_name: String,
    pub output_name: String,
    /// Number of predictions to report
    pub top_k: usize,
    /// Local image; when unset the sample is downloaded
    pub image: Option<PathBuf>,
    pub sample_url: String,
    /// Where the downloaded sample is written
    pub sample_path: PathBuf,
    pub source: SourceKind,
    pub seed: Option<u64>,
    pub health_timeout_secs: u64,
    pub infer_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// trace, debug, info, warn or error
    pub log_level: String,
    pub json: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            model: "resnet50".to_string(),
            input_name: "data".to_string(),
            output_name: "resnetv17_dense0_fwd".to_string(),
            top_k: 5,
            image: None,
            sample_url: DEFAULT_SAMPLE_URL.to_string(),
            sample_path: PathBuf::from("test_image.jpg"),
            source: SourceKind::Synthetic,
            seed: None,
            health_timeout_secs: 10,
            infer_timeout_secs: 30,
            download_timeout_secs: 30,
            log_level: "warn".to_string(),
            json: false,
        }
    }
}

impl ProbeConfig {
    /// Load defaults, then `file` (if any), then `PROBE_*` environment variables
    pub fn load(file: Option<&Path>) -> Result<Self, ProbeError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix("PROBE").try_parsing(true));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Command-line flags take precedence over every other layer
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.url {
            self.url = url.clone();
        }
        if let Some(image) = &cli.image {
            self.image = Some(image.clone());
        }
        if let Some(top_k) = cli.top_k {
            self.top_k = top_k;
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if let Some(output_name) = &cli.output_name {
            self.output_name = output_name.clone();
        }
        if let Some(source) = cli.source {
            self.source = source;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if cli.verbose {
            self.log_level = "debug".to_string();
        }
        self.json |= cli.json;
        self
    }

    /// Settings for the HTTP client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.url.clone(),
            model: self.model.clone(),
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
            health_timeout: Duration::from_secs(self.health_timeout_secs),
            infer_timeout: Duration::from_secs(self.infer_timeout_secs),
            download_timeout: Duration::from_secs(self.download_timeout_secs),
        }
    }

    /// Parsed log level; unknown names fall back to `warn`
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::WARN)
    }
}
