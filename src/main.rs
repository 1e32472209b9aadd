use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use door_ble_bridge_lib::commands;
use door_ble_bridge_lib::config::AppConfig;
use door_ble_bridge_lib::logging;
use log::{LevelFilter, error};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file, defaults to the per-user config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the sensor address from the config file
    #[arg(long, global = true)]
    address: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect to the sensor and log its notifications until Ctrl-C
    Start,
    /// Poll the sensor's advertisement data until Ctrl-C
    Beacon,
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

async fn run(cli: Cli) -> Result<bool> {
    let path = cli.config.unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load_config(&path).await?;
    if let Some(address) = cli.address {
        config.device.address = address;
    }
    config.validate()?;

    match cli.command {
        Command::Start => commands::start(config).await,
        Command::Beacon => commands::beacon(config).await.map(|()| true),
        Command::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save_config(&path).await?;
            }
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info });

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
