//! The `RiskStore` trait.
//!
//! Implemented by storage backends (e.g. `croprisk-store-sqlite`). The
//! ingestion orchestrator and the CLI depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  entity::{Commodity, Country},
  query::{
    CurrentRisk, GlobalAverage, HistComparison, HistoricalRisk, RegionalComparison, Scope,
    SeasonChange, SimilarYear, SpikeRegion, TrendPoint, YieldRisk,
  },
  record::{FactRecord, RawIngest},
};

/// Abstraction over a climate-risk store backend.
///
/// Writes are individually atomic; nothing spans several calls. Reads see
/// whatever was most recently committed. Queries that find nothing return
/// `None` (single answers) or an empty `Vec` (lists), never an error.
pub trait RiskStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Entity resolution ─────────────────────────────────────────────────

  /// Id of the commodity called `name`, creating it on first sight.
  fn resolve_commodity(
    &self,
    name: String,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Id of the country with `code`, creating it on first sight. `name`
  /// defaults to the code and is ignored for existing countries.
  fn resolve_country(
    &self,
    code: String,
    name: Option<String>,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Every known commodity, by name.
  fn commodities(&self) -> impl Future<Output = Result<Vec<Commodity>, Self::Error>> + Send + '_;

  /// Every known country or region, by code.
  fn countries(&self) -> impl Future<Output = Result<Vec<Country>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert the record, or overwrite every non-key column of the row that
  /// already has its natural key. Absent incoming values overwrite present
  /// ones.
  fn upsert(
    &self,
    record: FactRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append one entry to the raw audit trail. Duplicates are kept.
  fn record_raw(
    &self,
    entry: RawIngest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Rankings ──────────────────────────────────────────────────────────

  /// The row with the highest current-year value, optionally for one
  /// commodity. Ties go to the later year.
  fn highest_current_risk(
    &self,
    commodity: Option<String>,
  ) -> impl Future<Output = Result<Option<CurrentRisk>, Self::Error>> + Send + '_;

  /// Up to `k` rows, highest current-year value first, empty values last.
  fn top_current_risk(
    &self,
    commodity: String,
    k: usize,
  ) -> impl Future<Output = Result<Vec<CurrentRisk>, Self::Error>> + Send + '_;

  /// Up to `k` rows, lowest historical average first, empty values last.
  fn lowest_historical_risk(
    &self,
    commodity: String,
    k: usize,
  ) -> impl Future<Output = Result<Vec<HistoricalRisk>, Self::Error>> + Send + '_;

  // ── Comparisons ───────────────────────────────────────────────────────

  /// One year's current value against its historical average.
  fn compare_to_history(
    &self,
    commodity: String,
    country_code: String,
    year: i64,
  ) -> impl Future<Output = Result<Option<HistComparison>, Self::Error>> + Send + '_;

  /// Latest season against the previous one, or against the historical
  /// average when there is no usable previous season.
  fn season_change(
    &self,
    commodity: String,
    country_code: String,
  ) -> impl Future<Output = Result<Option<SeasonChange>, Self::Error>> + Send + '_;

  /// Mean current-year value across countries coded `region_code`, compared
  /// between two years. `commodity = None` averages across all commodities.
  fn regional_comparison(
    &self,
    region_code: String,
    commodity: Option<String>,
    current_year: i64,
    previous_year: i64,
  ) -> impl Future<Output = Result<Option<RegionalComparison>, Self::Error>> + Send + '_;

  // ── Similar years and yield ───────────────────────────────────────────

  /// The most recent most-similar-year record for the scope.
  fn most_similar_year(
    &self,
    commodity: String,
    scope: Scope,
  ) -> impl Future<Output = Result<Option<SimilarYear>, Self::Error>> + Send + '_;

  /// The most recent similar-year record joined with the risk aggregate of
  /// the same season year.
  fn yield_risk_relation(
    &self,
    commodity: String,
    scope: Scope,
  ) -> impl Future<Output = Result<Option<YieldRisk>, Self::Error>> + Send + '_;

  // ── Global aggregates ─────────────────────────────────────────────────

  /// The global average for a commodity and year.
  fn global_average(
    &self,
    commodity: String,
    year: i64,
    month: u32,
  ) -> impl Future<Output = Result<Option<GlobalAverage>, Self::Error>> + Send + '_;

  /// Yearly maximum risk over an inclusive year range, ascending. Missing
  /// years are not filled in.
  fn max_risk_trend(
    &self,
    commodity: String,
    scope: Scope,
    start_year: i64,
    end_year: i64,
  ) -> impl Future<Output = Result<Vec<TrendPoint>, Self::Error>> + Send + '_;

  /// Regions flagged for the upcoming season whose risk difference is
  /// strictly greater than `threshold`, largest first.
  fn upcoming_spikes(
    &self,
    commodity: String,
    threshold: f64,
  ) -> impl Future<Output = Result<Vec<SpikeRegion>, Self::Error>> + Send + '_;
}
