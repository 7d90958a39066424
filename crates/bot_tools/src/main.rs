//! Bot development tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bot-tools")]
#[command(about = "Development tools for the bot decision core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration files
    Validate {
        /// RON file, or directory of RON files
        #[arg(default_value = "config")]
        path: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the built-in configuration as RON
    Defaults,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path, json } => {
            tracing::info!("Validating configuration in: {}", path.display());
            let reports = match bot_tools::validate::validate_path(&path) {
                Ok(reports) => reports,
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(2);
                }
            };

            if json {
                match serde_json::to_string_pretty(&reports) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        tracing::error!("Failed to render report: {e}");
                        std::process::exit(2);
                    }
                }
            } else {
                for report in &reports {
                    println!("{report}");
                }
            }

            if reports.iter().all(bot_tools::validate::FileReport::is_valid) {
                tracing::info!(files = reports.len(), "Validation passed");
            } else {
                std::process::exit(1);
            }
        }
        Commands::Defaults => match bot_tools::validate::default_config_ron() {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!("Failed to render defaults: {e}");
                std::process::exit(2);
            }
        },
    }
}
