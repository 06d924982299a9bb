//! Integration tests for the ingestion orchestrator: feeds are served by a
//! wiremock server and merged into an in-memory SQLite store.

use std::{io, sync::Arc, time::Duration};

use croprisk_core::{
  entity::{Commodity, Country},
  query::{
    CurrentRisk, GlobalAverage, HistComparison, HistoricalRisk, RegionalComparison, Scope,
    SeasonChange, SimilarYear, SpikeRegion, TrendPoint, YieldRisk,
  },
  record::{FactRecord, RawIngest},
  store::RiskStore,
};
use croprisk_ingest::{Error, FeedClient, FeedSource, Ingestor};
use croprisk_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use wiremock::{
  Mock, MockServer, ResponseTemplate,
  matchers::{method, path},
};

async fn setup() -> (MockServer, Arc<SqliteStore>, Ingestor<SqliteStore>) {
  let server = MockServer::start().await;
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
  let client = FeedClient::new(Duration::from_secs(5)).expect("client");
  let ingestor = Ingestor::new(store.clone(), client);
  (server, store, ingestor)
}

/// An in-memory store whose raw-log or upsert writes can be made to fail.
struct FlakyStore {
  inner:       SqliteStore,
  fail_raw:    bool,
  fail_upsert: bool,
}

impl FlakyStore {
  async fn new(fail_raw: bool, fail_upsert: bool) -> Self {
    let inner = SqliteStore::open_in_memory().await.expect("in-memory store");
    Self { inner, fail_raw, fail_upsert }
  }
}

impl RiskStore for FlakyStore {
  type Error = io::Error;

  async fn resolve_commodity(&self, name: String) -> io::Result<i64> {
    self.inner.resolve_commodity(name).await.map_err(io::Error::other)
  }

  async fn resolve_country(&self, code: String, name: Option<String>) -> io::Result<i64> {
    self.inner.resolve_country(code, name).await.map_err(io::Error::other)
  }

  async fn commodities(&self) -> io::Result<Vec<Commodity>> {
    self.inner.commodities().await.map_err(io::Error::other)
  }

  async fn countries(&self) -> io::Result<Vec<Country>> {
    self.inner.countries().await.map_err(io::Error::other)
  }

  async fn upsert(&self, record: FactRecord) -> io::Result<()> {
    if self.fail_upsert {
      return Err(io::Error::other("upsert rejected"));
    }
    self.inner.upsert(record).await.map_err(io::Error::other)
  }

  async fn record_raw(&self, entry: RawIngest) -> io::Result<()> {
    if self.fail_raw {
      return Err(io::Error::other("raw log unavailable"));
    }
    self.inner.record_raw(entry).await.map_err(io::Error::other)
  }

  async fn highest_current_risk(&self, commodity: Option<String>) -> io::Result<Option<CurrentRisk>> {
    self.inner.highest_current_risk(commodity).await.map_err(io::Error::other)
  }

  async fn top_current_risk(&self, commodity: String, k: usize) -> io::Result<Vec<CurrentRisk>> {
    self.inner.top_current_risk(commodity, k).await.map_err(io::Error::other)
  }

  async fn lowest_historical_risk(
    &self,
    commodity: String,
    k: usize,
  ) -> io::Result<Vec<HistoricalRisk>> {
    self.inner.lowest_historical_risk(commodity, k).await.map_err(io::Error::other)
  }

  async fn compare_to_history(
    &self,
    commodity: String,
    country_code: String,
    year: i64,
  ) -> io::Result<Option<HistComparison>> {
    self
      .inner
      .compare_to_history(commodity, country_code, year)
      .await
      .map_err(io::Error::other)
  }

  async fn season_change(
    &self,
    commodity: String,
    country_code: String,
  ) -> io::Result<Option<SeasonChange>> {
    self.inner.season_change(commodity, country_code).await.map_err(io::Error::other)
  }

  async fn regional_comparison(
    &self,
    region_code: String,
    commodity: Option<String>,
    current_year: i64,
    previous_year: i64,
  ) -> io::Result<Option<RegionalComparison>> {
    self
      .inner
      .regional_comparison(region_code, commodity, current_year, previous_year)
      .await
      .map_err(io::Error::other)
  }

  async fn most_similar_year(&self, commodity: String, scope: Scope) -> io::Result<Option<SimilarYear>> {
    self.inner.most_similar_year(commodity, scope).await.map_err(io::Error::other)
  }

  async fn yield_risk_relation(&self, commodity: String, scope: Scope) -> io::Result<Option<YieldRisk>> {
    self.inner.yield_risk_relation(commodity, scope).await.map_err(io::Error::other)
  }

  async fn global_average(
    &self,
    commodity: String,
    year: i64,
    month: u32,
  ) -> io::Result<Option<GlobalAverage>> {
    self.inner.global_average(commodity, year, month).await.map_err(io::Error::other)
  }

  async fn max_risk_trend(
    &self,
    commodity: String,
    scope: Scope,
    start_year: i64,
    end_year: i64,
  ) -> io::Result<Vec<TrendPoint>> {
    self
      .inner
      .max_risk_trend(commodity, scope, start_year, end_year)
      .await
      .map_err(io::Error::other)
  }

  async fn upcoming_spikes(&self, commodity: String, threshold: f64) -> io::Result<Vec<SpikeRegion>> {
    self.inner.upcoming_spikes(commodity, threshold).await.map_err(io::Error::other)
  }
}

async fn flaky(fail_raw: bool, fail_upsert: bool) -> (MockServer, Arc<FlakyStore>, Ingestor<FlakyStore>) {
  let server = MockServer::start().await;
  let store = Arc::new(FlakyStore::new(fail_raw, fail_upsert).await);
  let client = FeedClient::new(Duration::from_secs(5)).expect("client");
  let ingestor = Ingestor::new(store.clone(), client);
  (server, store, ingestor)
}

async fn serve(server: &MockServer, route: &str, body: Value) {
  Mock::given(method("GET"))
    .and(path(route))
    .respond_with(ResponseTemplate::new(200).set_body_json(body))
    .mount(server)
    .await;
}

fn rice_india(current: &str) -> Value {
  json!([{
    "redis_key": "climate:rice:IN:2025",
    "commodity": "Rice",
    "country_code": "IN",
    "country_name": "India",
    "year": 2025,
    "hist_avg_wapr": "32.0",
    "this_year_avg_wapr": current,
    "current_season": "true"
  }])
}

#[tokio::test]
async fn reingesting_a_record_keeps_one_row_with_latest_values() {
  let (server, store, ingestor) = setup().await;
  serve(&server, "/first", rice_india("30.0")).await;
  serve(&server, "/second", rice_india("38.0")).await;

  let first = ingestor
    .ingest("climate_risk_by_country", &format!("{}/first", server.uri()))
    .await
    .unwrap();
  let second = ingestor
    .ingest("climate_risk_by_country", &format!("{}/second", server.uri()))
    .await
    .unwrap();
  assert_eq!(first.upserted, 1);
  assert_eq!(second.upserted, 1);

  let ranked = store.top_current_risk("Rice".into(), 10).await.unwrap();
  assert_eq!(ranked.len(), 1);
  assert_eq!(ranked[0].this_year_avg_wapr, Some(38.0));

  let audit = store.raw_entries("climate_risk_by_country").await.unwrap();
  assert_eq!(audit.len(), 2);
  assert_eq!(audit[0].source_key.as_deref(), Some("climate:rice:IN:2025"));
  assert_eq!(audit[1].payload["this_year_avg_wapr"], "38.0");
}

#[tokio::test]
async fn non_success_status_aborts_the_feed() {
  let (server, store, ingestor) = setup().await;
  Mock::given(method("GET"))
    .and(path("/broken"))
    .respond_with(ResponseTemplate::new(503))
    .mount(&server)
    .await;

  let err = ingestor
    .ingest("climate_risk_by_country", &format!("{}/broken", server.uri()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Status { status, .. } if status.as_u16() == 503));
  assert!(store.raw_entries("climate_risk_by_country").await.unwrap().is_empty());
}

#[tokio::test]
async fn non_array_body_is_rejected() {
  let (server, _store, ingestor) = setup().await;
  serve(&server, "/object", json!({ "items": [] })).await;

  let err = ingestor
    .ingest("climate_risk_by_country", &format!("{}/object", server.uri()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotAnArray { .. }));
}

#[tokio::test]
async fn unmapped_feed_only_writes_the_raw_log() {
  let (server, store, ingestor) = setup().await;
  serve(&server, "/alerts", json!([{ "commodity": "Rice", "alert": "flood" }])).await;

  let report = ingestor
    .ingest("weather_alerts", &format!("{}/alerts", server.uri()))
    .await
    .unwrap();
  assert!(!report.mapped);
  assert_eq!(report.records, 1);
  assert_eq!(report.raw_logged, 1);
  assert_eq!(report.upserted, 0);
  assert_eq!(store.raw_entries("weather_alerts").await.unwrap().len(), 1);
}

#[tokio::test]
async fn unusable_records_are_skipped_but_audited() {
  let (server, store, ingestor) = setup().await;
  serve(
    &server,
    "/mixed",
    json!([
      { "country_code": "IN", "year": 2025, "this_year_avg_wapr": 10 },
      { "commodity": "Rice", "country_code": "IN", "year": "later" },
      { "commodity": "Rice", "country_code": "TH", "year": 2025, "this_year_avg_wapr": "bad" }
    ]),
  )
  .await;

  let report = ingestor
    .ingest("climate_risk_by_country", &format!("{}/mixed", server.uri()))
    .await
    .unwrap();
  assert_eq!(report.records, 3);
  assert_eq!(report.raw_logged, 3);
  assert_eq!(report.skipped, 2);
  assert_eq!(report.upserted, 1);

  let ranked = store.top_current_risk("Rice".into(), 5).await.unwrap();
  assert_eq!(ranked.len(), 1);
  assert_eq!(ranked[0].country_code, "TH");
  assert_eq!(ranked[0].this_year_avg_wapr, None);
}

#[tokio::test]
async fn global_feeds_attribute_codeless_records_to_glb() {
  let (server, store, ingestor) = setup().await;
  serve(
    &server,
    "/global",
    json!([
      { "commodity": "Corn", "year": 2024, "hist_avg_wapr": 17.5, "hist_max_wapr": 41.0 },
      { "commodity": "Corn", "year": 2025, "hist_avg_wapr": 18.5, "hist_max_wapr": 44.0 }
    ]),
  )
  .await;

  ingestor
    .ingest("risk_global_avg_max", &format!("{}/global", server.uri()))
    .await
    .unwrap();

  let avg = store.global_average("Corn".into(), 2025, 7).await.unwrap().unwrap();
  assert_eq!(avg.global_avg_wapr, 18.5);

  let trend = store
    .max_risk_trend("Corn".into(), Scope::Global, 2024, 2025)
    .await
    .unwrap();
  assert_eq!(trend.len(), 2);
}

#[tokio::test]
async fn one_failing_feed_does_not_stop_the_next() {
  let (server, store, ingestor) = setup().await;
  Mock::given(method("GET"))
    .and(path("/down"))
    .respond_with(ResponseTemplate::new(500))
    .mount(&server)
    .await;
  serve(
    &server,
    "/spikes",
    json!([
      { "commodity": "Corn", "country_code": "US", "country_name": "United States",
        "avg_risk_score_diff": "5.0", "upcoming_season": "true" },
      { "commodity": "Corn", "country_code": "MX", "country_name": "Mexico",
        "avg_risk_score_diff": 5.1, "upcoming_season": true }
    ]),
  )
  .await;

  let feeds = [
    FeedSource {
      name: "climate_risk_by_country".into(),
      url:  format!("{}/down", server.uri()),
    },
    FeedSource {
      name: "risk_compared_hist_box".into(),
      url:  format!("{}/spikes", server.uri()),
    },
  ];
  let outcomes = ingestor.ingest_all(&feeds).await;

  assert_eq!(outcomes.len(), 2);
  assert!(outcomes[0].result.is_err());
  let report = outcomes[1].result.as_ref().unwrap();
  assert_eq!(report.upserted, 2);

  let spikes = store.upcoming_spikes("Corn".into(), 5.0).await.unwrap();
  assert_eq!(spikes.len(), 1);
  assert_eq!(spikes[0].country_code, "MX");
}

#[tokio::test]
async fn failed_raw_log_writes_do_not_block_upserts() {
  let (server, store, ingestor) = flaky(true, false).await;
  serve(
    &server,
    "/rice",
    json!([
      { "commodity": "Rice", "country_code": "IN", "year": 2025, "this_year_avg_wapr": 38.0 },
      { "commodity": "Rice", "country_name": "India", "date_on": "2025-06-01" }
    ]),
  )
  .await;

  let report = ingestor
    .ingest("climate_risk_by_country", &format!("{}/rice", server.uri()))
    .await
    .unwrap();
  assert_eq!(report.records, 2);
  assert_eq!(report.raw_logged, 0);
  assert_eq!(report.upserted, 1);
  assert_eq!(report.skipped, 1);
  assert_eq!(report.failed, 0);

  let top = store.highest_current_risk(None).await.unwrap().unwrap();
  assert_eq!(top.this_year_avg_wapr, Some(38.0));
  assert!(store.inner.raw_entries("climate_risk_by_country").await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_upserts_keep_their_raw_log_rows() {
  let (server, store, ingestor) = flaky(false, true).await;
  serve(&server, "/rice", rice_india("38.0")).await;

  let report = ingestor
    .ingest("climate_risk_by_country", &format!("{}/rice", server.uri()))
    .await
    .unwrap();
  assert_eq!(report.records, 1);
  assert_eq!(report.raw_logged, 1);
  assert_eq!(report.upserted, 0);
  assert_eq!(report.failed, 1);

  assert!(store.top_current_risk("Rice".into(), 5).await.unwrap().is_empty());
  assert_eq!(store.inner.raw_entries("climate_risk_by_country").await.unwrap().len(), 1);
}

#[tokio::test]
async fn raw_log_keeps_source_field_order() {
  let (server, store, ingestor) = setup().await;
  Mock::given(method("GET"))
    .and(path("/ordered"))
    .respond_with(ResponseTemplate::new(200).set_body_raw(
      r#"[{"year":2025,"commodity":"Rice","country_code":"IN","hist_avg_wapr":32.0}]"#,
      "application/json",
    ))
    .mount(&server)
    .await;

  ingestor
    .ingest("climate_risk_by_country", &format!("{}/ordered", server.uri()))
    .await
    .unwrap();

  let audit = store.raw_entries("climate_risk_by_country").await.unwrap();
  let keys: Vec<_> = audit[0].payload.as_object().unwrap().keys().cloned().collect();
  assert_eq!(keys, ["year", "commodity", "country_code", "hist_avg_wapr"]);
}
