use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use keel_core::{
    config::{AppConfig, LoggingConfig},
    provider::{ResilientProvider, ResilientProviderBuilder},
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
use commands::{chain, follow, handle_config_command, ConfigCommands, FollowOutput};

#[derive(Parser)]
#[command(name = "keel-cli")]
#[command(about = "Keel CLI - query a chain through several RPC endpoints and follow new blocks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(long, global = true, env = "KEEL_CONFIG", default_value = "config/config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print the consensus block height
    Height,

    /// Fetch a block by number, tag or hash
    Block {
        /// Block number (decimal or 0x-hex), tag or 32-byte hash
        #[arg(default_value = "latest")]
        id: String,

        /// Include full transaction objects
        #[arg(long)]
        full: bool,
    },

    /// Fetch logs over a block range
    Logs {
        #[arg(long)]
        from: String,

        #[arg(long, default_value = "latest")]
        to: String,

        /// Contract address filter (can be specified multiple times)
        #[arg(short, long)]
        address: Vec<String>,
    },

    /// Fetch a transaction receipt
    Receipt {
        hash: String,

        /// Wait until the receipt is this many blocks deep
        #[arg(short, long)]
        confirmations: Option<u64>,

        /// Timeout in seconds for --confirmations
        #[arg(long, default_value = "120")]
        timeout: u64,
    },

    /// Follow new blocks in order, resuming from the configured checkpoint
    Follow {
        #[arg(long, value_enum, default_value_t = OutputArg::Summary)]
        output: OutputArg,

        /// Stop after this many blocks
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputArg {
    Summary,
    Transactions,
}

impl From<OutputArg> for FollowOutput {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Summary => Self::Summary,
            OutputArg::Transactions => Self::Transactions,
        }
    }
}

/// Initializes the logging system based on the configuration.
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr so command
/// output on stdout stays machine readable.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,keel_core={level},cli={level}", level = config.level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(true)
            .with_line_number(true);
        registry.with(fmt_layer).init();
    }
}

fn load_config(path: &str) -> Result<AppConfig> {
    let config = AppConfig::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration from {path}: {e}"))?;
    config.validate().map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;
    Ok(config)
}

fn build_provider(config: &AppConfig) -> Result<ResilientProvider> {
    let provider = ResilientProviderBuilder::from_config(config).build()?;
    info!(endpoints = provider.endpoints().len(), "provider initialized");
    Ok(provider)
}

async fn run(command: Commands, config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    init_logging(&config.logging);
    let provider = build_provider(&config)?;

    match command {
        Commands::Config(_) => {}
        Commands::Height => chain::height(&provider).await?,
        Commands::Block { id, full } => chain::block(&provider, &id, full).await?,
        Commands::Logs { from, to, address } => chain::logs(&provider, &from, &to, address).await?,
        Commands::Receipt { hash, confirmations, timeout } => {
            chain::receipt(&provider, &hash, confirmations, Duration::from_secs(timeout)).await?;
        }
        Commands::Follow { output, limit } => {
            follow(&config, provider, output.into(), limit).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(config_command) => handle_config_command(config_command)?,
        command => run(command, &cli.config).await?,
    }

    Ok(())
}
