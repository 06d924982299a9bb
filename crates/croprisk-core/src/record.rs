//! Fact rows (the five relations feeds are merged into) and raw audit
//! entries.
//!
//! Each relation has a natural key. Writing a row whose key already exists
//! replaces every non-key column; see [`crate::store::RiskStore::upsert`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, entity::CountryFallback};

// ─── Relation ────────────────────────────────────────────────────────────────

/// The fact relations, named by the feed that populates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
  ClimateRiskByCountry,
  RiskComparedHistBox,
  RiskCurrentVsHist,
  RiskGlobalAvgMax,
  MostSimilarYear,
}

impl Relation {
  pub const ALL: [Relation; 5] = [
    Relation::ClimateRiskByCountry,
    Relation::RiskComparedHistBox,
    Relation::RiskCurrentVsHist,
    Relation::RiskGlobalAvgMax,
    Relation::MostSimilarYear,
  ];

  /// The feed identifier (and table name) for this relation.
  pub fn feed_name(self) -> &'static str {
    match self {
      Self::ClimateRiskByCountry => "climate_risk_by_country",
      Self::RiskComparedHistBox => "risk_compared_hist_box",
      Self::RiskCurrentVsHist => "risk_current_vs_hist",
      Self::RiskGlobalAvgMax => "risk_global_avg_max",
      Self::MostSimilarYear => "most_similar_year",
    }
  }

  /// Map a feed identifier to its relation. Unknown feeds have none.
  pub fn from_feed_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|r| r.feed_name() == name)
  }

  /// How records of this relation are attributed to a country when the feed
  /// omits the code. The current-vs-historical feed only carries a display
  /// name.
  pub fn country_fallback(self) -> CountryFallback {
    match self {
      Self::RiskCurrentVsHist => CountryFallback::DeriveFromName,
      _ => CountryFallback::Global,
    }
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Key: `(commodity, country, year)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimateRiskByCountry {
  pub year:               i64,
  pub hist_avg_wapr:      Option<f64>,
  pub this_year_avg_wapr: Option<f64>,
  pub current_season:     Option<bool>,
  pub most_recent_season: Option<bool>,
  pub upcoming_season:    Option<bool>,
  pub just_ended_season:  Option<bool>,
}

/// Key: `(commodity, country)`; the latest snapshot always wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskComparedHistBox {
  pub hist_risk_score:          Option<f64>,
  pub this_year_risk_score:     Option<f64>,
  pub avg_risk_score_diff:      Option<f64>,
  pub upcoming_year_risk_score: Option<f64>,
  pub risk_level:               Option<String>,
  pub current_season:           Option<bool>,
  pub just_ended_season:        Option<bool>,
  pub upcoming_season:          Option<bool>,
}

/// Key: `(commodity, country, date_on)`; accumulates one row per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskCurrentVsHist {
  pub date_on:        String,
  pub hist_wapr:      Option<f64>,
  pub this_year_wapr: Option<f64>,
  pub std_upper:      Option<f64>,
  pub std_lower:      Option<f64>,
  pub season_status:  Option<String>,
}

/// Key: `(commodity, country, year)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskGlobalAvgMax {
  pub year:            i64,
  pub hist_max_wapr:   Option<f64>,
  pub hist_avg_wapr:   Option<f64>,
  pub current_season:  Option<bool>,
  pub past_season:     Option<bool>,
  pub upcoming_season: Option<bool>,
}

/// Key: `(commodity, country, this_growing_season_year)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MostSimilarYear {
  pub this_growing_season_year:           i64,
  pub most_similar_growing_season_year:   Option<i64>,
  pub hist_avg_wapr_of_most_similar_year: Option<f64>,
  pub risk_category:                      Option<String>,
  pub star_rating:                        Option<i64>,
  pub total_production:                   Option<f64>,
  pub total_production_unit:              Option<String>,
  pub total_area_harvested:               Option<f64>,
  pub total_area_harvested_unit:          Option<String>,
  pub total_yield:                        Option<f64>,
  pub total_yield_unit:                   Option<String>,
  pub yield_rating:                       Option<String>,
  pub current_season:                     Option<bool>,
  pub upcoming_season:                    Option<bool>,
  pub just_ended_season:                  Option<bool>,
}

/// The non-entity columns of one fact row, tagged by relation.
#[derive(Debug, Clone, PartialEq)]
pub enum FactRow {
  ClimateRiskByCountry(ClimateRiskByCountry),
  RiskComparedHistBox(RiskComparedHistBox),
  RiskCurrentVsHist(RiskCurrentVsHist),
  RiskGlobalAvgMax(RiskGlobalAvgMax),
  MostSimilarYear(MostSimilarYear),
}

impl FactRow {
  pub fn relation(&self) -> Relation {
    match self {
      Self::ClimateRiskByCountry(_) => Relation::ClimateRiskByCountry,
      Self::RiskComparedHistBox(_) => Relation::RiskComparedHistBox,
      Self::RiskCurrentVsHist(_) => Relation::RiskCurrentVsHist,
      Self::RiskGlobalAvgMax(_) => Relation::RiskGlobalAvgMax,
      Self::MostSimilarYear(_) => Relation::MostSimilarYear,
    }
  }
}

/// Input to [`crate::store::RiskStore::upsert`]: a fact row with its
/// entities already resolved to surrogate ids.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRecord {
  pub commodity_id: i64,
  pub country_id:   i64,
  /// The upstream identifier of the record, if the feed supplied one.
  pub source_key:   Option<String>,
  pub row:          FactRow,
}

// ─── Raw audit log ───────────────────────────────────────────────────────────

/// One untouched source record, appended to the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIngest {
  pub endpoint_name: String,
  pub source_key:    Option<String>,
  pub payload:       serde_json::Value,
  pub ingested_at:   DateTime<Utc>,
}

impl RawIngest {
  /// Compact JSON for the `payload` column.
  pub fn payload_json(&self) -> Result<String> { Ok(serde_json::to_string(&self.payload)?) }
}
