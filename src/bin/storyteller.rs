//! Storyteller Binary
//!
//! HTTP API and prompt preview for the storyteller service.

use clap::Parser;
use std::process;
use storyteller::cli::{compose_output, load_config, Cli, Commands};
use storyteller::logging::init_logging;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    match &cli.command {
        Commands::Compose(args) => match compose_output(args) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(2);
            }
        },
        Commands::Serve { .. } => {
            if let Err(e) = config.ensure_valid() {
                error!("Invalid configuration: {}", e);
                eprintln!("{}", e);
                process::exit(1);
            }

            info!(
                provider = ?config.text.provider,
                model = %config.text.resolved_model(),
                speech = config.speech.enabled,
                image = config.image.enabled,
                "Storyteller starting"
            );

            if let Err(e) = storyteller::server::run(&config).await {
                error!("Server failed: {:#}", e);
                eprintln!("{:#}", e);
                process::exit(1);
            }
        }
    }
}
