//! CLI definitions using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;
use crate::config::{init_logger, load_dotenv, ImportSettings, DEFAULT_TIMEOUT_SECS};
use crate::data::ExtJsonMode;


/// JSON Seeder - replace MongoDB collections with the contents of Extended JSON files
#[derive(Parser)]
#[command(name = "json-seeder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Option<Commands>,
}


#[derive(Subcommand)]
enum Commands {
    /// Import files into collections, replacing their contents
    Import {
        /// MongoDB connection string
        #[arg(long, env = "MONGO_URI", hide_env_values = true)]
        uri: String,

        /// Database name
        #[arg(long = "db", env = "MONGO_DB")]
        database: String,

        /// A .json file, or a directory whose *.json children are imported
        #[arg(long, env = "JSON_PATH")]
        path: PathBuf,

        /// Deadline in seconds for clearing and inserting one file
        #[arg(long, env = "IMPORT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// Accept relaxed Extended JSON shorthand (numeric $date, legacy $binary, ...)
        #[arg(long)]
        relaxed: bool,
    },

    /// Parse files and show target collections without touching the database
    Check {
        /// A .json file, or a directory whose *.json children are checked
        #[arg(long, env = "JSON_PATH")]
        path: PathBuf,

        /// Accept relaxed Extended JSON shorthand
        #[arg(long)]
        relaxed: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}


/// Run the CLI
pub async fn run() -> anyhow::Result<()> {
    // Before parsing, so .env values can fill env-backed flags
    let dotenv = load_dotenv();

    let cli = Cli::parse();
    init_logger(cli.log_level);

    match dotenv {
        Ok(Some(path)) => log::debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => log::warn!("{e:#}"),
    }

    match cli.command {
        Some(Commands::Import { uri, database, path, timeout_secs, relaxed }) => {
            let settings = ImportSettings {
                uri,
                database,
                path,
                timeout: Duration::from_secs(timeout_secs),
                mode: ExtJsonMode::from_relaxed_flag(relaxed),
            };
            commands::import::run(settings).await?;
        }
        Some(Commands::Check { path, relaxed, json }) => {
            commands::check::run(&path, ExtJsonMode::from_relaxed_flag(relaxed), json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
