//! Runtime configuration: an optional TOML file overlaid by `CROPRISK_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use croprisk_ingest::FeedSource;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite database file; a leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Upper bound on each feed fetch.
  #[serde(default = "default_fetch_timeout_secs")]
  pub fetch_timeout_secs: u64,
  /// Feeds ingested by `croprisk ingest`, in order.
  #[serde(default)]
  pub feeds:              Vec<FeedSource>,
}

fn default_store_path() -> PathBuf { PathBuf::from("croprisk.db") }

fn default_fetch_timeout_secs() -> u64 { 30 }

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("CROPRISK"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
