//! JSON Seeder CLI
//!
//! Loads Extended JSON files into MongoDB, one collection per file.

mod cli;
mod commands;
mod config;
mod data;
mod models;
mod storage;


#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
