//! The ingestion orchestrator.
//!
//! For every record of a feed: append the raw payload to the audit trail,
//! then (if the feed maps to a relation) resolve its entities and upsert
//! the fact row. The two writes are attempted independently; neither
//! outcome affects the other.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use croprisk_core::{
  record::{FactRecord, RawIngest, Relation},
  store::RiskStore,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument as _;

use crate::{
  Error, Result,
  client::FeedClient,
  mapping::{ParsedRecord, parse_record, source_key},
};

/// A named upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
  pub name: String,
  pub url:  String,
}

/// Per-feed counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
  pub feed:       String,
  /// Whether the feed maps to a fact relation at all.
  pub mapped:     bool,
  pub records:    usize,
  pub raw_logged: usize,
  pub upserted:   usize,
  /// Records with no commodity or no usable natural key.
  pub skipped:    usize,
  /// Records whose resolution or upsert failed in the store.
  pub failed:     usize,
}

/// The result of one feed within [`Ingestor::ingest_all`].
#[derive(Debug)]
pub struct FeedOutcome {
  pub feed:   String,
  pub result: Result<IngestReport>,
}

/// Drives feeds into a [`RiskStore`].
pub struct Ingestor<S> {
  store:  Arc<S>,
  client: FeedClient,
}

impl<S> Ingestor<S>
where
  S: RiskStore,
{
  pub fn new(store: Arc<S>, client: FeedClient) -> Self { Self { store, client } }

  /// Ingest one feed. A transport failure aborts this feed; per-record
  /// failures are logged and counted in the report.
  pub async fn ingest(&self, feed_name: &str, url: &str) -> Result<IngestReport> {
    let span = tracing::info_span!("ingest_feed", feed = feed_name, url);
    self.ingest_inner(feed_name, url).instrument(span).await
  }

  /// Ingest feeds strictly one after another. A failed feed is logged and
  /// does not stop the ones after it.
  pub async fn ingest_all(&self, feeds: &[FeedSource]) -> Vec<FeedOutcome> {
    let mut outcomes = Vec::with_capacity(feeds.len());
    for feed in feeds {
      let result = self.ingest(&feed.name, &feed.url).await;
      if let Err(e) = &result {
        tracing::error!(feed = %feed.name, error = %e, "feed ingestion failed");
      }
      outcomes.push(FeedOutcome { feed: feed.name.clone(), result });
    }
    outcomes
  }

  async fn ingest_inner(&self, feed_name: &str, url: &str) -> Result<IngestReport> {
    let items = self.client.fetch(url).await?;
    let relation = Relation::from_feed_name(feed_name);
    if relation.is_none() {
      tracing::warn!("feed maps to no relation; recording raw payloads only");
    }

    let ingested_at = Utc::now();
    let mut report = IngestReport {
      feed: feed_name.to_owned(),
      mapped: relation.is_some(),
      ..Default::default()
    };

    for item in items {
      report.records += 1;

      if self.log_raw(feed_name, &item, ingested_at).await {
        report.raw_logged += 1;
      }

      let Some(relation) = relation else { continue };

      let parsed = match parse_record(relation, &item) {
        Ok(parsed) => parsed,
        Err(skip) => {
          tracing::warn!(reason = %skip, "skipping record");
          report.skipped += 1;
          continue;
        }
      };

      match self.merge(parsed).await {
        Ok(()) => report.upserted += 1,
        Err(e) => {
          tracing::warn!(error = %e, "record upsert failed");
          report.failed += 1;
        }
      }
    }

    tracing::info!(
      records = report.records,
      raw_logged = report.raw_logged,
      upserted = report.upserted,
      skipped = report.skipped,
      failed = report.failed,
      "feed ingested"
    );
    Ok(report)
  }

  /// Best-effort audit write. Returns whether it succeeded.
  async fn log_raw(&self, feed_name: &str, item: &Value, ingested_at: DateTime<Utc>) -> bool {
    let entry = RawIngest {
      endpoint_name: feed_name.to_owned(),
      source_key: source_key(item),
      payload: item.clone(),
      ingested_at,
    };
    match self.store.record_raw(entry).await {
      Ok(()) => true,
      Err(e) => {
        tracing::warn!(error = %e, "raw log write failed");
        false
      }
    }
  }

  async fn merge(&self, parsed: ParsedRecord) -> Result<()> {
    let ParsedRecord { commodity, country, source_key, row } = parsed;

    let commodity_id = self
      .store
      .resolve_commodity(commodity)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    let country_id = self
      .store
      .resolve_country(country.code, Some(country.name))
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    self
      .store
      .upsert(FactRecord { commodity_id, country_id, source_key, row })
      .await
      .map_err(|e| Error::Store(Box::new(e)))
  }
}
