//! Read-side SQL for the analytical queries.
//!
//! Each function runs on the connection thread and returns plain rows;
//! derived metrics are computed in [`crate::store`] from these.

use croprisk_core::{
  entity::{Commodity, Country, GLOBAL_CODE},
  query::{CurrentRisk, HistoricalRisk, SpikeRegion, TrendPoint, YieldRisk},
  record::MostSimilarYear,
};
use rusqlite::{Connection, OptionalExtension as _, Row};

/// `(year, this_year_avg_wapr, hist_avg_wapr)`
pub type SeasonRow = (i64, Option<f64>, Option<f64>);

fn current_risk(row: &Row<'_>) -> rusqlite::Result<CurrentRisk> {
  Ok(CurrentRisk {
    commodity:          row.get(0)?,
    country_code:       row.get(1)?,
    country_name:       row.get(2)?,
    year:               row.get(3)?,
    this_year_avg_wapr: row.get(4)?,
    hist_avg_wapr:      row.get(5)?,
  })
}

const CURRENT_RISK_SELECT: &str = "
  SELECT com.name, ctry.code, ctry.name, byc.year, byc.this_year_avg_wapr, byc.hist_avg_wapr
  FROM climate_risk_by_country byc
  JOIN commodities com ON com.id  = byc.commodity_id
  JOIN countries  ctry ON ctry.id = byc.country_id";

// ─── Entities ───────────────────────────────────────────────────────────────

pub fn commodities(conn: &Connection) -> rusqlite::Result<Vec<Commodity>> {
  let mut stmt = conn.prepare("SELECT id, name, slug FROM commodities ORDER BY name ASC")?;
  let rows = stmt
    .query_map([], |row| Ok(Commodity { id: row.get(0)?, name: row.get(1)?, slug: row.get(2)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn countries(conn: &Connection) -> rusqlite::Result<Vec<Country>> {
  let mut stmt = conn.prepare("SELECT id, code, name FROM countries ORDER BY code ASC")?;
  let rows = stmt
    .query_map([], |row| Ok(Country { id: row.get(0)?, code: row.get(1)?, name: row.get(2)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Rankings ────────────────────────────────────────────────────────────────

pub fn highest_current_risk(
  conn:      &Connection,
  commodity: Option<&str>,
) -> rusqlite::Result<Option<CurrentRisk>> {
  conn
    .query_row(
      &format!(
        "{CURRENT_RISK_SELECT}
         WHERE byc.this_year_avg_wapr IS NOT NULL
           AND (?1 IS NULL OR com.name = ?1)
         ORDER BY byc.this_year_avg_wapr DESC, byc.year DESC
         LIMIT 1"
      ),
      rusqlite::params![commodity],
      current_risk,
    )
    .optional()
}

// SQLite sorts NULL first ascending and last descending; the explicit
// `IS NULL` key puts empty values last in both directions.

pub fn top_current_risk(
  conn:      &Connection,
  commodity: &str,
  k:         i64,
) -> rusqlite::Result<Vec<CurrentRisk>> {
  let mut stmt = conn.prepare(&format!(
    "{CURRENT_RISK_SELECT}
     WHERE com.name = ?1
     ORDER BY (byc.this_year_avg_wapr IS NULL) ASC, byc.this_year_avg_wapr DESC, byc.year DESC
     LIMIT ?2"
  ))?;
  let rows = stmt
    .query_map(rusqlite::params![commodity, k], current_risk)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn lowest_historical_risk(
  conn:      &Connection,
  commodity: &str,
  k:         i64,
) -> rusqlite::Result<Vec<HistoricalRisk>> {
  let mut stmt = conn.prepare(
    "SELECT ctry.code, ctry.name, byc.year, byc.hist_avg_wapr
     FROM climate_risk_by_country byc
     JOIN commodities com ON com.id  = byc.commodity_id
     JOIN countries  ctry ON ctry.id = byc.country_id
     WHERE com.name = ?1
     ORDER BY (byc.hist_avg_wapr IS NULL) ASC, byc.hist_avg_wapr ASC, ctry.code ASC
     LIMIT ?2",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![commodity, k], |row| {
      Ok(HistoricalRisk {
        country_code:  row.get(0)?,
        country_name:  row.get(1)?,
        year:          row.get(2)?,
        hist_avg_wapr: row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Comparisons ─────────────────────────────────────────────────────────────

pub fn country_year(
  conn:         &Connection,
  commodity:    &str,
  country_code: &str,
  year:         i64,
) -> rusqlite::Result<Option<CurrentRisk>> {
  conn
    .query_row(
      &format!(
        "{CURRENT_RISK_SELECT}
         WHERE com.name = ?1 AND ctry.code = ?2 AND byc.year = ?3"
      ),
      rusqlite::params![commodity, country_code, year],
      current_risk,
    )
    .optional()
}

/// The two most recent yearly rows, latest first.
pub fn latest_seasons(
  conn:         &Connection,
  commodity:    &str,
  country_code: &str,
) -> rusqlite::Result<Vec<SeasonRow>> {
  let mut stmt = conn.prepare(
    "SELECT byc.year, byc.this_year_avg_wapr, byc.hist_avg_wapr
     FROM climate_risk_by_country byc
     JOIN commodities com ON com.id  = byc.commodity_id
     JOIN countries  ctry ON ctry.id = byc.country_id
     WHERE com.name = ?1 AND ctry.code = ?2
     ORDER BY byc.year DESC
     LIMIT 2",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![commodity, country_code], |row| {
      Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Mean of the non-empty current-year values for a region and year.
pub fn regional_mean(
  conn:        &Connection,
  region_code: &str,
  commodity:   Option<&str>,
  year:        i64,
) -> rusqlite::Result<Option<f64>> {
  conn.query_row(
    "SELECT AVG(byc.this_year_avg_wapr)
     FROM climate_risk_by_country byc
     JOIN commodities com ON com.id  = byc.commodity_id
     JOIN countries  ctry ON ctry.id = byc.country_id
     WHERE ctry.code = ?1
       AND byc.year = ?2
       AND byc.this_year_avg_wapr IS NOT NULL
       AND (?3 IS NULL OR com.name = ?3)",
    rusqlite::params![region_code, year, commodity],
    |r| r.get(0),
  )
}

// ─── Similar years and yield ─────────────────────────────────────────────────

/// Returns `(commodity, country_code, country_name, record)`.
pub fn most_similar_year(
  conn:         &Connection,
  commodity:    &str,
  country_code: &str,
) -> rusqlite::Result<Option<(String, String, String, MostSimilarYear)>> {
  conn
    .query_row(
      "SELECT com.name, ctry.code, ctry.name,
              m.this_growing_season_year, m.most_similar_growing_season_year,
              m.hist_avg_wapr_of_most_similar_year, m.risk_category, m.star_rating,
              m.total_production, m.total_production_unit,
              m.total_area_harvested, m.total_area_harvested_unit,
              m.total_yield, m.total_yield_unit, m.yield_rating,
              m.current_season, m.upcoming_season, m.just_ended_season
       FROM most_similar_year m
       JOIN commodities com ON com.id  = m.commodity_id
       JOIN countries  ctry ON ctry.id = m.country_id
       WHERE com.name = ?1 AND ctry.code = ?2
       ORDER BY m.this_growing_season_year DESC
       LIMIT 1",
      rusqlite::params![commodity, country_code],
      |row| {
        let record = MostSimilarYear {
          this_growing_season_year:           row.get(3)?,
          most_similar_growing_season_year:   row.get(4)?,
          hist_avg_wapr_of_most_similar_year: row.get(5)?,
          risk_category:                      row.get(6)?,
          star_rating:                        row.get(7)?,
          total_production:                   row.get(8)?,
          total_production_unit:              row.get(9)?,
          total_area_harvested:               row.get(10)?,
          total_area_harvested_unit:          row.get(11)?,
          total_yield:                        row.get(12)?,
          total_yield_unit:                   row.get(13)?,
          yield_rating:                       row.get(14)?,
          current_season:                     row.get(15)?,
          upcoming_season:                    row.get(16)?,
          just_ended_season:                  row.get(17)?,
        };
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, record))
      },
    )
    .optional()
}

pub fn yield_risk_relation(
  conn:         &Connection,
  commodity:    &str,
  country_code: &str,
) -> rusqlite::Result<Option<YieldRisk>> {
  conn
    .query_row(
      "SELECT com.name, ctry.code, m.this_growing_season_year,
              m.yield_rating, m.total_yield, m.total_yield_unit,
              g.hist_avg_wapr, g.hist_max_wapr
       FROM most_similar_year m
       JOIN commodities com ON com.id  = m.commodity_id
       JOIN countries  ctry ON ctry.id = m.country_id
       LEFT JOIN risk_global_avg_max g
         ON  g.commodity_id = m.commodity_id
         AND g.country_id   = m.country_id
         AND g.year         = m.this_growing_season_year
       WHERE com.name = ?1 AND ctry.code = ?2
       ORDER BY m.this_growing_season_year DESC
       LIMIT 1",
      rusqlite::params![commodity, country_code],
      |row| {
        Ok(YieldRisk {
          commodity:                row.get(0)?,
          country_code:             row.get(1)?,
          this_growing_season_year: row.get(2)?,
          yield_rating:             row.get(3)?,
          total_yield:              row.get(4)?,
          total_yield_unit:         row.get(5)?,
          hist_avg_wapr:            row.get(6)?,
          hist_max_wapr:            row.get(7)?,
        })
      },
    )
    .optional()
}

// ─── Global aggregates ───────────────────────────────────────────────────────

/// `(hist_avg_wapr, hist_max_wapr)` of the global row for a year.
pub fn global_avg_max(
  conn:      &Connection,
  commodity: &str,
  year:      i64,
) -> rusqlite::Result<Option<(Option<f64>, Option<f64>)>> {
  conn
    .query_row(
      "SELECT r.hist_avg_wapr, r.hist_max_wapr
       FROM risk_global_avg_max r
       JOIN commodities com ON com.id  = r.commodity_id
       JOIN countries  ctry ON ctry.id = r.country_id
       WHERE com.name = ?1 AND ctry.code = ?2 AND r.year = ?3",
      rusqlite::params![commodity, GLOBAL_CODE, year],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

pub fn max_risk_trend(
  conn:         &Connection,
  commodity:    &str,
  country_code: &str,
  start_year:   i64,
  end_year:     i64,
) -> rusqlite::Result<Vec<TrendPoint>> {
  let mut stmt = conn.prepare(
    "SELECT r.year, r.hist_max_wapr
     FROM risk_global_avg_max r
     JOIN commodities com ON com.id  = r.commodity_id
     JOIN countries  ctry ON ctry.id = r.country_id
     WHERE com.name = ?1 AND ctry.code = ?2 AND r.year BETWEEN ?3 AND ?4
     ORDER BY r.year ASC",
  )?;
  let rows = stmt
    .query_map(
      rusqlite::params![commodity, country_code, start_year, end_year],
      |row| Ok(TrendPoint { year: row.get(0)?, hist_max_wapr: row.get(1)? }),
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn upcoming_spikes(
  conn:      &Connection,
  commodity: &str,
  threshold: f64,
) -> rusqlite::Result<Vec<SpikeRegion>> {
  let mut stmt = conn.prepare(
    "SELECT ctry.code, ctry.name, r.avg_risk_score_diff, r.upcoming_year_risk_score
     FROM risk_compared_hist_box r
     JOIN commodities com ON com.id  = r.commodity_id
     JOIN countries  ctry ON ctry.id = r.country_id
     WHERE com.name = ?1
       AND r.upcoming_season = 1
       AND r.avg_risk_score_diff IS NOT NULL
       AND r.avg_risk_score_diff > ?2
     ORDER BY r.avg_risk_score_diff DESC",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![commodity, threshold], |row| {
      Ok(SpikeRegion {
        country_code:             row.get(0)?,
        country_name:             row.get(1)?,
        avg_risk_score_diff:      row.get(2)?,
        upcoming_year_risk_score: row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}
