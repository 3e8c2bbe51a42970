use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use poeflip::core::Unit;
use poeflip::core::log::init_logging;

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

impl From<Commands> for poeflip::AppCommand {
    fn from(cmd: Commands) -> poeflip::AppCommand {
        match cmd {
            Commands::Summary => poeflip::AppCommand::Summary,
            Commands::Add {
                item,
                buy,
                unit,
                qty,
                sell,
                sell_unit,
                group,
            } => poeflip::AppCommand::Add(poeflip::AddArgs {
                item,
                buy,
                unit,
                quantity: qty,
                sell,
                sell_unit,
                group,
            }),
            Commands::Complete {
                id,
                sell,
                unit,
                qty,
            } => poeflip::AppCommand::Complete(poeflip::CompleteArgs {
                id,
                sell,
                unit,
                quantity: qty,
            }),
            Commands::Rate { refresh } => poeflip::AppCommand::Rate { refresh },
            Commands::League { name } => poeflip::AppCommand::League { name },
            Commands::Settings { enable, disable } => {
                poeflip::AppCommand::Settings(poeflip::SettingsArgs { enable, disable })
            }
            Commands::Export { path } => poeflip::AppCommand::Export { path },
            Commands::Import { path } => poeflip::AppCommand::Import { path },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display open transactions with current profit
    Summary,
    /// Record a new buy
    Add {
        /// Item being flipped
        item: String,
        /// Buy price per unit; arithmetic expressions are accepted
        #[arg(long)]
        buy: String,
        /// Denomination of the buy price
        #[arg(long, default_value = "chaos")]
        unit: Unit,
        /// Number of items bought
        #[arg(long, default_value = "1")]
        qty: String,
        /// Target sell price per unit
        #[arg(long)]
        sell: Option<String>,
        /// Denomination of the sell price, defaults to the buy denomination
        #[arg(long)]
        sell_unit: Option<Unit>,
        /// Group this transaction under a named bucket
        #[arg(long)]
        group: Option<String>,
    },
    /// Mark an open transaction as sold
    Complete {
        /// Id of the open transaction
        id: u64,
        /// Realized sell price per unit; arithmetic expressions are accepted
        #[arg(long)]
        sell: String,
        /// Denomination of the sell price
        #[arg(long)]
        unit: Option<Unit>,
        /// Quantity actually sold
        #[arg(long)]
        qty: Option<String>,
    },
    /// Show or refresh the exchange rate
    Rate {
        /// Fetch a fresh rate from the price feed
        #[arg(long)]
        refresh: bool,
    },
    /// Show or select the active league
    League { name: Option<String> },
    /// Show or change feature toggles and display preferences
    Settings {
        /// Turn a setting on
        #[arg(long, value_name = "FLAG")]
        enable: Vec<String>,
        /// Turn a setting off
        #[arg(long, value_name = "FLAG")]
        disable: Vec<String>,
    },
    /// Write all stored data to a JSON file
    Export { path: String },
    /// Load stored data from a JSON file
    Import { path: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => poeflip::cli::setup::setup(),
        Some(cmd) => poeflip::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
