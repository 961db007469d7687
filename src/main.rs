use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use pdfrag::cli::commands;
use pdfrag::cli::{Cli, Commands};
use pdfrag::documents::PdfExtractor;
use pdfrag::store::CollectionStore;
use pdfrag::{RagEngine, Settings, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let Cli { config, command } = Cli::parse();

    match command {
        // Init needs no settings
        Commands::Init { force } => commands::init::run_init(force),
        command => {
            let settings = load_settings(config.as_deref())?;
            logging::init_with_config(&settings.logging);
            tracing::debug!(target: "cli", "loaded settings: {settings:?}");
            run(command, &settings).await
        }
    }
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load configuration")
}

async fn run(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Init { force } => commands::init::run_init(force),
        Commands::Config => commands::init::run_config(settings),
        Commands::Status { name } => {
            let store = CollectionStore::open(settings.resolved_store_path())?;
            commands::query::run_status(&store, &name)
        }
        Commands::List { json } => {
            let store = CollectionStore::open(settings.resolved_store_path())?;
            commands::query::run_list(&store, json)
        }
        Commands::Text { name } => {
            let extractor = PdfExtractor::new(settings.resolved_documents_dir());
            commands::query::run_text(&extractor, &name).await
        }
        Commands::Index { name, force } => {
            let engine = RagEngine::from_settings(settings)?;
            commands::index::run(&engine, &name, force).await
        }
        Commands::Ask {
            name,
            query,
            k,
            json,
        } => {
            let engine = RagEngine::from_settings(settings)?;
            commands::query::run_ask(&engine, &name, &query, k, json).await
        }
        Commands::Serve => {
            let engine = RagEngine::from_settings(settings)?;
            commands::serve::run(engine).await
        }
    }
}
