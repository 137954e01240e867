use clap::Subcommand;
use keel_core::config::AppConfig;
use std::path::Path;

use super::utils::{print_error, print_info, print_json, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Show the effective configuration (file plus KEEL__* overrides)
    Show {
        /// Path to config file
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },
}

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file } => show_config(&file),
    }
}

fn load(file: &str) -> CliResult<AppConfig> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))
}

fn validate_config(file: &str) -> CliResult<()> {
    let config = load(file)?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Endpoints: {}", config.upstreams.providers.len());
    for provider in &config.upstreams.providers {
        println!("    - {} ({})", provider.name, provider.url);
    }
    println!("  Consensus window: {} blocks", config.rpc.consensus_window);
    println!(
        "  Timeouts: height {}ms, standard {}ms, logs x{}",
        config.rpc.height_timeout_ms, config.rpc.request_timeout_ms, config.rpc.log_timeout_multiplier
    );
    println!(
        "  Ingestion: batch {}, replay window {}, commit {:?}",
        config.ingest.batch_size, config.ingest.replay_window, config.ingest.commit_order
    );
    println!(
        "  Checkpoint: {}",
        config.checkpoint.path.as_deref().unwrap_or("in-memory")
    );

    Ok(())
}

fn show_config(file: &str) -> CliResult<()> {
    let config = load(file)?;
    print_json(&config)
}
