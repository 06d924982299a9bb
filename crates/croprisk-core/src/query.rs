//! Parameters and answer shapes of the analytical queries.
//!
//! Every answer carries display names joined back from the entity tables.
//! Absent metrics serialize as `null`, never omitted.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  entity::GLOBAL_CODE,
  metrics::Direction,
  record::MostSimilarYear,
};

// ─── Scope ───────────────────────────────────────────────────────────────────

/// Whether a query reads the global aggregate or one country.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
  #[default]
  Global,
  Country(String),
}

impl Scope {
  /// Build a scope from its wire form. `"country"` without a code falls back
  /// to the global aggregate.
  pub fn from_parts(scope: &str, country_code: Option<String>) -> Result<Self> {
    match (scope.parse::<ScopeKind>()?, country_code) {
      (ScopeKind::Country, Some(code)) if !code.trim().is_empty() => Ok(Self::Country(code)),
      _ => Ok(Self::Global),
    }
  }

  /// The country code rows must match under this scope.
  pub fn country_code(&self) -> &str {
    match self {
      Self::Global => GLOBAL_CODE,
      Self::Country(code) => code,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
  Global,
  Country,
}

impl FromStr for ScopeKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "global" => Ok(Self::Global),
      "country" => Ok(Self::Country),
      _ => Err(Error::UnknownScope(s.to_owned())),
    }
  }
}

// ─── Answers ─────────────────────────────────────────────────────────────────

/// A climate-risk-by-country row ranked by its current-year metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentRisk {
  pub commodity:          String,
  pub country_code:       String,
  pub country_name:       String,
  pub year:               i64,
  pub this_year_avg_wapr: Option<f64>,
  pub hist_avg_wapr:      Option<f64>,
}

/// A country ranked by its historical average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRisk {
  pub country_code:  String,
  pub country_name:  String,
  pub year:          i64,
  pub hist_avg_wapr: Option<f64>,
}

/// One year's current value against its historical average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistComparison {
  pub commodity:          String,
  pub country_code:       String,
  pub country_name:       String,
  pub year:               i64,
  pub hist_avg_wapr:      Option<f64>,
  pub this_year_avg_wapr: Option<f64>,
  pub delta:              Option<f64>,
  pub percent:            Option<f64>,
}

/// The most recent most-similar-year analogy for a commodity and scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarYear {
  pub commodity:    String,
  pub country_code: String,
  pub country_name: String,
  #[serde(flatten)]
  pub record:       MostSimilarYear,
}

/// Global average and maximum for a commodity in a given year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalAverage {
  pub commodity:       String,
  pub year:            i64,
  /// Echoed back; the store keeps yearly granularity only.
  pub month:           u32,
  pub global_avg_wapr: f64,
  pub global_max_wapr: Option<f64>,
  pub region:          String,
}

/// One point of a yearly max-risk series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
  pub year:          i64,
  pub hist_max_wapr: Option<f64>,
}

/// What the latest season was compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
  PreviousYear,
  HistoricalAverage,
}

/// Latest season versus the one before it (or the historical average).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonChange {
  pub commodity:     String,
  pub country_code:  String,
  pub current_year:  i64,
  pub current_wapr:  f64,
  pub previous_wapr: f64,
  pub baseline:      Baseline,
  pub delta:         f64,
  pub direction:     Direction,
}

/// Yield metrics of the latest similar-year record next to the risk
/// aggregate for the same season year, if one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldRisk {
  pub commodity:                String,
  pub country_code:             String,
  pub this_growing_season_year: i64,
  pub yield_rating:             Option<String>,
  pub total_yield:              Option<f64>,
  pub total_yield_unit:         Option<String>,
  pub hist_avg_wapr:            Option<f64>,
  pub hist_max_wapr:            Option<f64>,
}

/// A region whose upcoming season is expected to exceed its norm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeRegion {
  pub country_code:             String,
  pub country_name:             String,
  pub avg_risk_score_diff:      f64,
  pub upcoming_year_risk_score: Option<f64>,
}

/// Mean current-year risk of an aggregate region in two years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalComparison {
  pub region_code:       String,
  /// `None` when averaged across every commodity.
  pub commodity:         Option<String>,
  pub current_year:      i64,
  pub previous_year:     i64,
  pub current_avg_wapr:  f64,
  pub previous_avg_wapr: f64,
  pub delta:             f64,
  pub percent_change:    Option<f64>,
  pub direction:         Direction,
}
