//! Error type for `croprisk-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] croprisk_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Resolution was asked for a commodity with an empty name.
  #[error("commodity name is empty")]
  MissingCommodity,

  /// The row was neither found nor created, even after re-querying.
  #[error("could not resolve {kind} {key:?}")]
  EntityUnresolved { kind: &'static str, key: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
