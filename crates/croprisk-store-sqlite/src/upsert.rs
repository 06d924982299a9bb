//! Natural-key upserts for the five fact relations.
//!
//! Each statement inserts the row or, on a natural-key conflict, overwrites
//! every non-key column with the incoming value (`NULL` included). One
//! statement per record, so each upsert is atomic on its own.

use croprisk_core::record::{
  ClimateRiskByCountry, FactRecord, FactRow, MostSimilarYear, RiskComparedHistBox,
  RiskCurrentVsHist, RiskGlobalAvgMax,
};
use rusqlite::Connection;

pub fn upsert(conn: &Connection, record: &FactRecord) -> rusqlite::Result<()> {
  let FactRecord { commodity_id, country_id, source_key, row } = record;
  match row {
    FactRow::ClimateRiskByCountry(r) => {
      climate_risk_by_country(conn, *commodity_id, *country_id, source_key.as_deref(), r)
    }
    FactRow::RiskComparedHistBox(r) => {
      risk_compared_hist_box(conn, *commodity_id, *country_id, source_key.as_deref(), r)
    }
    FactRow::RiskCurrentVsHist(r) => {
      risk_current_vs_hist(conn, *commodity_id, *country_id, source_key.as_deref(), r)
    }
    FactRow::RiskGlobalAvgMax(r) => {
      risk_global_avg_max(conn, *commodity_id, *country_id, source_key.as_deref(), r)
    }
    FactRow::MostSimilarYear(r) => {
      most_similar_year(conn, *commodity_id, *country_id, source_key.as_deref(), r)
    }
  }
}

fn climate_risk_by_country(
  conn:         &Connection,
  commodity_id: i64,
  country_id:   i64,
  source_key:   Option<&str>,
  r:            &ClimateRiskByCountry,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO climate_risk_by_country (
       source_key, commodity_id, country_id, year, hist_avg_wapr, this_year_avg_wapr,
       current_season, most_recent_season, upcoming_season, just_ended_season
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
     ON CONFLICT (commodity_id, country_id, year) DO UPDATE SET
       source_key         = excluded.source_key,
       hist_avg_wapr      = excluded.hist_avg_wapr,
       this_year_avg_wapr = excluded.this_year_avg_wapr,
       current_season     = excluded.current_season,
       most_recent_season = excluded.most_recent_season,
       upcoming_season    = excluded.upcoming_season,
       just_ended_season  = excluded.just_ended_season",
    rusqlite::params![
      source_key,
      commodity_id,
      country_id,
      r.year,
      r.hist_avg_wapr,
      r.this_year_avg_wapr,
      r.current_season,
      r.most_recent_season,
      r.upcoming_season,
      r.just_ended_season,
    ],
  )?;
  Ok(())
}

fn risk_compared_hist_box(
  conn:         &Connection,
  commodity_id: i64,
  country_id:   i64,
  source_key:   Option<&str>,
  r:            &RiskComparedHistBox,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO risk_compared_hist_box (
       source_key, commodity_id, country_id, hist_risk_score, this_year_risk_score,
       avg_risk_score_diff, upcoming_year_risk_score, risk_level,
       current_season, just_ended_season, upcoming_season
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
     ON CONFLICT (commodity_id, country_id) DO UPDATE SET
       source_key               = excluded.source_key,
       hist_risk_score          = excluded.hist_risk_score,
       this_year_risk_score     = excluded.this_year_risk_score,
       avg_risk_score_diff      = excluded.avg_risk_score_diff,
       upcoming_year_risk_score = excluded.upcoming_year_risk_score,
       risk_level               = excluded.risk_level,
       current_season           = excluded.current_season,
       just_ended_season        = excluded.just_ended_season,
       upcoming_season          = excluded.upcoming_season",
    rusqlite::params![
      source_key,
      commodity_id,
      country_id,
      r.hist_risk_score,
      r.this_year_risk_score,
      r.avg_risk_score_diff,
      r.upcoming_year_risk_score,
      r.risk_level,
      r.current_season,
      r.just_ended_season,
      r.upcoming_season,
    ],
  )?;
  Ok(())
}

fn risk_current_vs_hist(
  conn:         &Connection,
  commodity_id: i64,
  country_id:   i64,
  source_key:   Option<&str>,
  r:            &RiskCurrentVsHist,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO risk_current_vs_hist (
       source_key, commodity_id, country_id, date_on, hist_wapr, this_year_wapr,
       std_upper, std_lower, season_status
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT (commodity_id, country_id, date_on) DO UPDATE SET
       source_key     = excluded.source_key,
       hist_wapr      = excluded.hist_wapr,
       this_year_wapr = excluded.this_year_wapr,
       std_upper      = excluded.std_upper,
       std_lower      = excluded.std_lower,
       season_status  = excluded.season_status",
    rusqlite::params![
      source_key,
      commodity_id,
      country_id,
      r.date_on,
      r.hist_wapr,
      r.this_year_wapr,
      r.std_upper,
      r.std_lower,
      r.season_status,
    ],
  )?;
  Ok(())
}

fn risk_global_avg_max(
  conn:         &Connection,
  commodity_id: i64,
  country_id:   i64,
  source_key:   Option<&str>,
  r:            &RiskGlobalAvgMax,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO risk_global_avg_max (
       source_key, commodity_id, country_id, year, hist_max_wapr, hist_avg_wapr,
       current_season, past_season, upcoming_season
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT (commodity_id, country_id, year) DO UPDATE SET
       source_key      = excluded.source_key,
       hist_max_wapr   = excluded.hist_max_wapr,
       hist_avg_wapr   = excluded.hist_avg_wapr,
       current_season  = excluded.current_season,
       past_season     = excluded.past_season,
       upcoming_season = excluded.upcoming_season",
    rusqlite::params![
      source_key,
      commodity_id,
      country_id,
      r.year,
      r.hist_max_wapr,
      r.hist_avg_wapr,
      r.current_season,
      r.past_season,
      r.upcoming_season,
    ],
  )?;
  Ok(())
}

fn most_similar_year(
  conn:         &Connection,
  commodity_id: i64,
  country_id:   i64,
  source_key:   Option<&str>,
  r:            &MostSimilarYear,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO most_similar_year (
       source_key, commodity_id, country_id, this_growing_season_year,
       most_similar_growing_season_year, hist_avg_wapr_of_most_similar_year,
       risk_category, star_rating,
       total_production, total_production_unit,
       total_area_harvested, total_area_harvested_unit,
       total_yield, total_yield_unit, yield_rating,
       current_season, upcoming_season, just_ended_season
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
     ON CONFLICT (commodity_id, country_id, this_growing_season_year) DO UPDATE SET
       source_key                         = excluded.source_key,
       most_similar_growing_season_year   = excluded.most_similar_growing_season_year,
       hist_avg_wapr_of_most_similar_year = excluded.hist_avg_wapr_of_most_similar_year,
       risk_category                      = excluded.risk_category,
       star_rating                        = excluded.star_rating,
       total_production                   = excluded.total_production,
       total_production_unit              = excluded.total_production_unit,
       total_area_harvested               = excluded.total_area_harvested,
       total_area_harvested_unit          = excluded.total_area_harvested_unit,
       total_yield                        = excluded.total_yield,
       total_yield_unit                   = excluded.total_yield_unit,
       yield_rating                       = excluded.yield_rating,
       current_season                     = excluded.current_season,
       upcoming_season                    = excluded.upcoming_season,
       just_ended_season                  = excluded.just_ended_season",
    rusqlite::params![
      source_key,
      commodity_id,
      country_id,
      r.this_growing_season_year,
      r.most_similar_growing_season_year,
      r.hist_avg_wapr_of_most_similar_year,
      r.risk_category,
      r.star_rating,
      r.total_production,
      r.total_production_unit,
      r.total_area_harvested,
      r.total_area_harvested_unit,
      r.total_yield,
      r.total_yield_unit,
      r.yield_rating,
      r.current_season,
      r.upcoming_season,
      r.just_ended_season,
    ],
  )?;
  Ok(())
}
