//! BizLens CLI entry point.

use bizlens_cli::build_orchestrator;
use bizlens_cli::command::Command;
use bizlens_cli::config::ClientConfig;
use bizlens_cli::error::CliError;
use bizlens_client::{init_tracing, TelemetryConfig};

#[tokio::main]
async fn main() {
    if let Err(err) = init_tracing(&TelemetryConfig::from_env()) {
        eprintln!("warning: tracing not initialized: {}", err);
    }

    if let Err(err) = run().await {
        eprintln!("error: {}", err);
        std::process::exit(err.exit_code());
    }
}

async fn run() -> Result<(), CliError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    let config = ClientConfig::load()?;
    let api = build_orchestrator(&config)?;

    tracing::debug!(command = ?command, base_url = %config.api_base_url, "Running command");
    let output = command.run(&api).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
