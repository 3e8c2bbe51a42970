pub mod cli;
pub mod config;
pub mod core;
pub mod providers;
pub mod store;

use anyhow::Result;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::providers::{CachingRateProvider, NinjaRateProvider};
use crate::store::{DiskStore, KeyValue};

pub use cli::add::AddArgs;
pub use cli::complete::CompleteArgs;
pub use cli::settings::SettingsArgs;

/// Commands the application can execute, independent of the argument parser.
pub enum AppCommand {
    Summary,
    Add(AddArgs),
    Complete(CompleteArgs),
    Rate { refresh: bool },
    League { name: Option<String> },
    Settings(SettingsArgs),
    Export { path: String },
    Import { path: String },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("poeflip starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let disk = Arc::new(DiskStore::open(&config.default_data_path()?)?);
    let store: Arc<dyn KeyValue> = disk.clone();

    let provider = CachingRateProvider::new(
        NinjaRateProvider::new(config.ninja_base_url()),
        Arc::clone(&store),
        Duration::minutes(config.rate_ttl_minutes),
    );

    let result = match command {
        AppCommand::Summary => cli::summary::run(&config, Arc::clone(&store), &provider).await,
        AppCommand::Add(args) => cli::add::run(&config, Arc::clone(&store), args),
        AppCommand::Complete(args) => cli::complete::run(&config, Arc::clone(&store), args),
        AppCommand::Rate { refresh } => {
            cli::rate::run(&config, Arc::clone(&store), &provider, refresh).await
        }
        AppCommand::League { name } => cli::league::run(&config, Arc::clone(&store), name),
        AppCommand::Settings(args) => cli::settings::run(Arc::clone(&store), args),
        AppCommand::Export { path } => cli::transfer::export(Arc::clone(&store), &path),
        AppCommand::Import { path } => cli::transfer::import(Arc::clone(&store), &path),
    };

    if let Err(e) = disk.persist() {
        warn!("Failed to flush state to disk: {e}");
    }
    result
}
