pub mod cli;
pub mod core;
pub mod providers;
pub mod store;
pub mod sync;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    /// Derive and store rates for the given currencies
    Sync {
        currencies: Vec<String>,
        reference: Option<String>,
    },
    /// Show the stored rate matrix
    Rates,
    /// Convert an amount with the stored rates
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => {
            let path = AppConfig::default_config_path()?;
            if path.exists() {
                AppConfig::load_from_path(&path)
            } else {
                debug!("No config at {}, using defaults", path.display());
                Ok(AppConfig::default())
            }
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("xrate starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Sync {
            currencies,
            reference,
        } => cli::sync::run(&config, currencies, reference).await.map(|_| ()),
        AppCommand::Rates => cli::rates::run(&config).await,
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(&config, amount, &from, &to).await
        }
    }
}
