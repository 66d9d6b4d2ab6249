//! Inference Probe - Main Entry Point

use clap::Parser;
use probe::{init_logging, run_cli, Cli, ProbeConfig};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match ProbeConfig::load(cli.config.as_deref()) {
        Ok(config) => {
            let config = config.apply_cli(&cli);
            init_logging(config.level());
            run_cli(&config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
