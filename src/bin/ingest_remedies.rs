//! Replace the remedies collection with the contents of a JSON file.
//!
//! `ingest_remedies remedies.json` reads `MONGODB_URI` (and optionally
//! `MONGODB_DATABASE`) from the environment or a `.env` file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use medask_lib::config;
use medask_lib::db::MongoRemedyStore;
use medask_lib::remedies;

#[derive(Parser)]
#[command(name = "ingest_remedies", about = "Load a remedies dataset into MongoDB")]
struct Cli {
    /// JSON array of remedies
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// MongoDB connection string
    #[arg(
        long,
        env = "MONGODB_URI",
        default_value = "mongodb://localhost:27017/medaskai",
        hide_env_values = true
    )]
    mongodb_uri: String,

    /// Database name; defaults to the one in the URI, then `medaskai`
    #[arg(long, env = "MONGODB_DATABASE")]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    medask_lib::init_tracing();

    let cli = Cli::parse();

    let contents = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    let dataset = remedies::parse_remedy_file(&contents)
        .with_context(|| format!("parsing {}", cli.file.display()))?;
    tracing::info!(count = dataset.len(), file = %cli.file.display(), "Loaded remedies dataset");

    let database = config::resolve_database(cli.database.as_deref(), &cli.mongodb_uri);
    let store = MongoRemedyStore::connect(&cli.mongodb_uri, &database)
        .await
        .context("connecting to MongoDB")?;
    store.ping().await.context("pinging MongoDB")?;
    tracing::info!(database = %database, "MongoDB connected, ingesting remedies");

    let (deleted, inserted) = remedies::replace_all(&store, &dataset)
        .await
        .context("replacing remedies")?;
    tracing::info!(deleted, inserted, "Ingestion complete");
    println!("Inserted {inserted} remedies.");
    Ok(())
}
