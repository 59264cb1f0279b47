use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::warn;
use xrate::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch rates and store every currency pair
    Sync {
        /// Currencies as positional arguments (deprecated, use --currencies)
        #[arg(conflicts_with = "currencies")]
        legacy_currencies: Vec<String>,

        /// Comma separated currencies, the first is the reference
        #[arg(long, value_delimiter = ',')]
        currencies: Vec<String>,

        /// Reference currency the direct rates are quoted from
        #[arg(short, long)]
        reference: Option<String>,
    },
    /// Display the stored rate matrix
    Rates,
    /// Convert an amount between two currencies
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
}

impl From<Commands> for xrate::AppCommand {
    fn from(cmd: Commands) -> xrate::AppCommand {
        match cmd {
            Commands::Sync {
                legacy_currencies,
                currencies,
                reference,
            } => {
                let currencies = if legacy_currencies.is_empty() {
                    currencies
                } else {
                    warn!("Positional currencies are deprecated, use --currencies instead");
                    legacy_currencies
                };
                xrate::AppCommand::Sync {
                    currencies,
                    reference,
                }
            }
            Commands::Rates => xrate::AppCommand::Rates,
            Commands::Convert { amount, from, to } => {
                xrate::AppCommand::Convert { amount, from, to }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xrate::cli::setup::setup(),
        Some(cmd) => xrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
