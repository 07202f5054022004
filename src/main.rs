use std::process::ExitCode;

use clap::Parser;
use maestro::cli::{self, Cli, NO_PROMPT_MESSAGE};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let Some(prompt) = cli.prompt() else {
        println!("{}", NO_PROMPT_MESSAGE);
        return ExitCode::FAILURE;
    };

    // Logs go to stderr; stdout carries only the answer
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli::run(prompt).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Request failed: {:#}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
