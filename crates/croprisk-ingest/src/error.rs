//! Error type for `croprisk-ingest`.

use reqwest::StatusCode;
use thiserror::Error;

/// A failure that aborts ingestion of one feed. Problems with individual
/// records never surface here; they are logged and counted instead.
#[derive(Debug, Error)]
pub enum Error {
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("GET {url} → {status}")]
  Status { url: String, status: StatusCode },

  #[error("feed {url} did not return a JSON array")]
  NotAnArray { url: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
