//! Mapping of flat feed records onto fact rows.
//!
//! Field names are fixed per feed. Values go through the permissive
//! coercions in [`croprisk_core::coerce`], so a malformed value becomes an
//! empty column rather than a rejected record. Only a missing commodity or a
//! missing natural-key component causes a record to be skipped.

use croprisk_core::{
  coerce::{to_flag, to_float, to_int, to_text},
  entity::CountryRef,
  record::{
    ClimateRiskByCountry, FactRow, MostSimilarYear, Relation, RiskComparedHistBox,
    RiskCurrentVsHist, RiskGlobalAvgMax,
  },
};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field carrying the upstream identifier of a record.
pub const SOURCE_KEY_FIELD: &str = "redis_key";

/// Why a record produced no fact row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Skip {
  #[error("record is not a JSON object")]
  NotAnObject,
  #[error("record has no commodity")]
  MissingCommodity,
  #[error("record has no usable {0}")]
  MissingKey(&'static str),
}

/// A feed record with its entity references still unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
  pub commodity:  String,
  pub country:    CountryRef,
  pub source_key: Option<String>,
  pub row:        FactRow,
}

/// The upstream identifier of a raw record, if any.
pub fn source_key(item: &Value) -> Option<String> { to_text(item.get(SOURCE_KEY_FIELD)) }

pub fn parse_record(relation: Relation, item: &Value) -> Result<ParsedRecord, Skip> {
  let fields = item.as_object().ok_or(Skip::NotAnObject)?;
  let commodity = to_text(fields.get("commodity")).ok_or(Skip::MissingCommodity)?;

  let code = to_text(fields.get("country_code"));
  let name = to_text(fields.get("country_name"));
  let country = relation
    .country_fallback()
    .resolve(code.as_deref(), name.as_deref());

  let row = match relation {
    Relation::ClimateRiskByCountry => climate_risk_by_country(fields)?,
    Relation::RiskComparedHistBox => risk_compared_hist_box(fields),
    Relation::RiskCurrentVsHist => risk_current_vs_hist(fields)?,
    Relation::RiskGlobalAvgMax => risk_global_avg_max(fields)?,
    Relation::MostSimilarYear => most_similar_year(fields)?,
  };

  Ok(ParsedRecord { commodity, country, source_key: source_key(item), row })
}

fn int_key(fields: &Map<String, Value>, key: &'static str) -> Result<i64, Skip> {
  to_int(fields.get(key)).ok_or(Skip::MissingKey(key))
}

fn climate_risk_by_country(f: &Map<String, Value>) -> Result<FactRow, Skip> {
  Ok(FactRow::ClimateRiskByCountry(ClimateRiskByCountry {
    year:               int_key(f, "year")?,
    hist_avg_wapr:      to_float(f.get("hist_avg_wapr")),
    this_year_avg_wapr: to_float(f.get("this_year_avg_wapr")),
    current_season:     to_flag(f.get("current_season")),
    most_recent_season: to_flag(f.get("most_recent_season")),
    upcoming_season:    to_flag(f.get("upcoming_season")),
    just_ended_season:  to_flag(f.get("just_ended_season")),
  }))
}

fn risk_compared_hist_box(f: &Map<String, Value>) -> FactRow {
  FactRow::RiskComparedHistBox(RiskComparedHistBox {
    hist_risk_score:          to_float(f.get("hist_risk_score")),
    this_year_risk_score:     to_float(f.get("this_year_risk_score")),
    avg_risk_score_diff:      to_float(f.get("avg_risk_score_diff")),
    upcoming_year_risk_score: to_float(f.get("upcoming_year_risk_score")),
    risk_level:               to_text(f.get("risk_level")),
    current_season:           to_flag(f.get("current_season")),
    just_ended_season:        to_flag(f.get("just_ended_season")),
    upcoming_season:          to_flag(f.get("upcoming_season")),
  })
}

fn risk_current_vs_hist(f: &Map<String, Value>) -> Result<FactRow, Skip> {
  Ok(FactRow::RiskCurrentVsHist(RiskCurrentVsHist {
    date_on:        to_text(f.get("date_on")).ok_or(Skip::MissingKey("date_on"))?,
    hist_wapr:      to_float(f.get("hist_wapr")),
    this_year_wapr: to_float(f.get("this_year_wapr")),
    std_upper:      to_float(f.get("std_upper")),
    std_lower:      to_float(f.get("std_lower")),
    season_status:  to_text(f.get("season_status")),
  }))
}

fn risk_global_avg_max(f: &Map<String, Value>) -> Result<FactRow, Skip> {
  Ok(FactRow::RiskGlobalAvgMax(RiskGlobalAvgMax {
    year:            int_key(f, "year")?,
    hist_max_wapr:   to_float(f.get("hist_max_wapr")),
    hist_avg_wapr:   to_float(f.get("hist_avg_wapr")),
    current_season:  to_flag(f.get("current_season")),
    past_season:     to_flag(f.get("past_season")),
    upcoming_season: to_flag(f.get("upcoming_season")),
  }))
}

fn most_similar_year(f: &Map<String, Value>) -> Result<FactRow, Skip> {
  Ok(FactRow::MostSimilarYear(MostSimilarYear {
    this_growing_season_year:           int_key(f, "this_growing_season_year")?,
    most_similar_growing_season_year:   to_int(f.get("most_similar_growing_season_year")),
    hist_avg_wapr_of_most_similar_year: to_float(f.get("hist_avg_wapr_of_most_similar_year")),
    risk_category:                      to_text(f.get("risk_category")),
    star_rating:                        to_int(f.get("star_rating")),
    total_production:                   to_float(f.get("total_production")),
    total_production_unit:              to_text(f.get("total_production_unit")),
    total_area_harvested:               to_float(f.get("total_area_harvested")),
    total_area_harvested_unit:          to_text(f.get("total_area_harvested_unit")),
    total_yield:                        to_float(f.get("total_yield")),
    total_yield_unit:                   to_text(f.get("total_yield_unit")),
    yield_rating:                       to_text(f.get("yield_rating")),
    current_season:                     to_flag(f.get("current_season")),
    upcoming_season:                    to_flag(f.get("upcoming_season")),
    just_ended_season:                  to_flag(f.get("just_ended_season")),
  }))
}
