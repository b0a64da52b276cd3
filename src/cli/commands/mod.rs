//! CLI commands implementation.

mod config_cmd;
mod download;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{default_config_path, Config};

#[derive(Parser)]
#[command(name = "letterfetch")]
#[command(about = "Batch retrieval of referral letters from the Ocean API")]
#[command(version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Download the letter for every reference in an input file
    Download {
        /// Input file: one reference per line (.txt) or first CSV column (.csv)
        input: PathBuf,

        /// Output directory (overrides the stored preference)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Delay between requests in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Print the batch summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage stored configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Store API credentials (and optionally the Ocean host)
    SetCredentials {
        client_id: String,
        client_secret: String,
        /// Ocean host the credentials belong to
        #[arg(long)]
        host: Option<String>,
    },

    /// Set the default output directory
    SetOutputDir { dir: PathBuf },

    /// Show the resolved configuration
    Show,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).await?;
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    match cli.command {
        Commands::Download {
            input,
            output_dir,
            delay_ms,
            json,
        } => download::cmd_download(&config, &input, output_dir, delay_ms, json).await,
        Commands::Config { command } => match command {
            ConfigCommands::SetCredentials {
                client_id,
                client_secret,
                host,
            } => {
                config_cmd::cmd_set_credentials(config, &config_path, client_id, client_secret, host)
                    .await
            }
            ConfigCommands::SetOutputDir { dir } => {
                config_cmd::cmd_set_output_dir(config, &config_path, &dir).await
            }
            ConfigCommands::Show => config_cmd::cmd_show(&config),
        },
    }
}
