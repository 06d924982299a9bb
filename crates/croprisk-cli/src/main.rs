//! `croprisk`: ingest climate-risk feeds and query the resulting store.
//!
//! # Usage
//!
//! ```text
//! croprisk ingest
//! croprisk ingest --feed climate_risk_by_country
//! croprisk query highest-current-risk --commodity Rice
//! croprisk query upcoming-spike-regions --commodity Corn --threshold 5
//! croprisk audit --feed most_similar_year
//! ```

mod query;
mod settings;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use croprisk_ingest::{FeedClient, Ingestor};
use croprisk_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Commodity climate-risk ingestion and queries")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "croprisk.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Fetch the configured feeds, one after another, into the store.
  Ingest {
    /// Only ingest the named feed(s).
    #[arg(long = "feed", value_name = "NAME")]
    feeds: Vec<String>,
  },
  /// Answer an analytical question from the store.
  Query {
    #[command(subcommand)]
    query: query::Query,
  },
  /// Print the raw audit trail of one feed.
  Audit {
    #[arg(long)]
    feed: String,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays clean JSON.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  match cli.command {
    Command::Ingest { feeds } => ingest(store, &settings, &feeds).await,
    Command::Query { query: q } => query::run(&store, q).await,
    Command::Audit { feed } => {
      let entries = store.raw_entries(feed).await?;
      println!("{}", serde_json::to_string_pretty(&entries)?);
      Ok(())
    }
  }
}

async fn ingest(store: SqliteStore, settings: &Settings, only: &[String]) -> anyhow::Result<()> {
  let feeds: Vec<_> = settings
    .feeds
    .iter()
    .filter(|f| only.is_empty() || only.contains(&f.name))
    .cloned()
    .collect();

  if feeds.is_empty() {
    bail!("no matching feeds configured");
  }

  let client = FeedClient::new(Duration::from_secs(settings.fetch_timeout_secs))
    .context("failed to build HTTP client")?;
  let ingestor = Ingestor::new(Arc::new(store), client);

  let outcomes = ingestor.ingest_all(&feeds).await;
  let mut failed = 0;
  for outcome in &outcomes {
    match &outcome.result {
      Ok(report) => println!("{}", serde_json::to_string(report)?),
      Err(_) => failed += 1,
    }
  }

  if failed > 0 {
    bail!("{failed} of {} feeds failed", outcomes.len());
  }
  Ok(())
}
