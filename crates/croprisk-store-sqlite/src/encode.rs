//! Conversions between domain types and SQLite column values.
//!
//! Timestamps are stored as RFC 3339 strings. Season flags rely on
//! rusqlite's `bool` mapping to `0`/`1`; absent flags are `NULL`.

use chrono::{DateTime, Utc};
use croprisk_core::record::RawIngest;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns read directly from a `raw_ingest` row.
pub struct RawAuditRow {
  pub endpoint_name: String,
  pub source_key:    Option<String>,
  pub payload:       String,
  pub ingested_at:   String,
}

impl RawAuditRow {
  pub fn into_entry(self) -> Result<RawIngest> {
    Ok(RawIngest {
      endpoint_name: self.endpoint_name,
      source_key:    self.source_key,
      payload:       serde_json::from_str(&self.payload)?,
      ingested_at:   decode_dt(&self.ingested_at)?,
    })
  }
}
