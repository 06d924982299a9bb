//! [`SqliteStore`]: the SQLite implementation of [`RiskStore`].

use std::path::Path;

use croprisk_core::{
  entity::{Commodity, Country, CountryFallback, GLOBAL_NAME},
  metrics::{Change, Direction, percent_change},
  query::{
    Baseline, CurrentRisk, GlobalAverage, HistComparison, HistoricalRisk, RegionalComparison,
    Scope, SeasonChange, SimilarYear, SpikeRegion, TrendPoint, YieldRisk,
  },
  record::{FactRecord, RawIngest},
  store::RiskStore,
};

use crate::{
  Error, Result,
  encode::{RawAuditRow, encode_dt},
  queries, resolve,
  schema::{BUSY_TIMEOUT, SCHEMA},
  upsert,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A climate-risk store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Handles are
/// passed explicitly to whoever needs one; there is no global connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  pub(crate) async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The audit trail for one feed, oldest first.
  pub async fn raw_entries(&self, endpoint_name: impl Into<String>) -> Result<Vec<RawIngest>> {
    let endpoint_name = endpoint_name.into();

    let raws: Vec<RawAuditRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT endpoint_name, source_key, payload, ingested_at
           FROM raw_ingest
           WHERE endpoint_name = ?1
           ORDER BY id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![endpoint_name], |row| {
            Ok(RawAuditRow {
              endpoint_name: row.get(0)?,
              source_key:    row.get(1)?,
              payload:       row.get(2)?,
              ingested_at:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditRow::into_entry).collect()
  }
}

fn limit(k: usize) -> i64 { i64::try_from(k).unwrap_or(i64::MAX) }

// ─── RiskStore impl ──────────────────────────────────────────────────────────

impl RiskStore for SqliteStore {
  type Error = Error;

  // ── Entity resolution ─────────────────────────────────────────────────────

  async fn resolve_commodity(&self, name: String) -> Result<i64> {
    if name.trim().is_empty() {
      return Err(Error::MissingCommodity);
    }

    let key = name.clone();
    let id = self
      .conn
      .call(move |conn| Ok(resolve::resolve_commodity(conn, &key)?))
      .await?;

    id.ok_or(Error::EntityUnresolved { kind: "commodity", key: name })
  }

  async fn resolve_country(&self, code: String, name: Option<String>) -> Result<i64> {
    let country = CountryFallback::Global.resolve(Some(&code), name.as_deref());

    let key = country.code.clone();
    let id = self
      .conn
      .call(move |conn| Ok(resolve::resolve_country(conn, &country)?))
      .await?;

    id.ok_or(Error::EntityUnresolved { kind: "country", key })
  }

  async fn commodities(&self) -> Result<Vec<Commodity>> {
    Ok(self.conn.call(|conn| Ok(queries::commodities(conn)?)).await?)
  }

  async fn countries(&self) -> Result<Vec<Country>> {
    Ok(self.conn.call(|conn| Ok(queries::countries(conn)?)).await?)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert(&self, record: FactRecord) -> Result<()> {
    self
      .conn
      .call(move |conn| Ok(upsert::upsert(conn, &record)?))
      .await?;
    Ok(())
  }

  async fn record_raw(&self, entry: RawIngest) -> Result<()> {
    let payload = entry.payload_json()?;
    let at_str  = encode_dt(entry.ingested_at);
    let RawIngest { endpoint_name, source_key, .. } = entry;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO raw_ingest (endpoint_name, source_key, payload, ingested_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![endpoint_name, source_key, payload, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Rankings ──────────────────────────────────────────────────────────────

  async fn highest_current_risk(&self, commodity: Option<String>) -> Result<Option<CurrentRisk>> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(queries::highest_current_risk(conn, commodity.as_deref())?))
        .await?,
    )
  }

  async fn top_current_risk(&self, commodity: String, k: usize) -> Result<Vec<CurrentRisk>> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(queries::top_current_risk(conn, &commodity, limit(k))?))
        .await?,
    )
  }

  async fn lowest_historical_risk(
    &self,
    commodity: String,
    k:         usize,
  ) -> Result<Vec<HistoricalRisk>> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(queries::lowest_historical_risk(conn, &commodity, limit(k))?))
        .await?,
    )
  }

  // ── Comparisons ───────────────────────────────────────────────────────────

  async fn compare_to_history(
    &self,
    commodity:    String,
    country_code: String,
    year:         i64,
  ) -> Result<Option<HistComparison>> {
    let row = self
      .conn
      .call(move |conn| Ok(queries::country_year(conn, &commodity, &country_code, year)?))
      .await?;

    Ok(row.map(|r| {
      let change = Change::between(r.this_year_avg_wapr, r.hist_avg_wapr);
      HistComparison {
        commodity:          r.commodity,
        country_code:       r.country_code,
        country_name:       r.country_name,
        year:               r.year,
        hist_avg_wapr:      r.hist_avg_wapr,
        this_year_avg_wapr: r.this_year_avg_wapr,
        delta:              change.delta,
        percent:            change.percent,
      }
    }))
  }

  async fn season_change(
    &self,
    commodity:    String,
    country_code: String,
  ) -> Result<Option<SeasonChange>> {
    let (commodity_q, code_q) = (commodity.clone(), country_code.clone());
    let rows = self
      .conn
      .call(move |conn| Ok(queries::latest_seasons(conn, &commodity_q, &code_q)?))
      .await?;

    let Some(&(current_year, current, hist)) = rows.first() else {
      return Ok(None);
    };
    let (Some(current_wapr), Some(hist_avg)) = (current, hist) else {
      return Ok(None);
    };

    let (previous_wapr, baseline) = match rows.get(1).and_then(|&(_, prev, _)| prev) {
      Some(prev) => (prev, Baseline::PreviousYear),
      None => (hist_avg, Baseline::HistoricalAverage),
    };
    let delta = current_wapr - previous_wapr;

    Ok(Some(SeasonChange {
      commodity,
      country_code,
      current_year,
      current_wapr,
      previous_wapr,
      baseline,
      delta,
      direction: Direction::classify(delta),
    }))
  }

  async fn regional_comparison(
    &self,
    region_code:   String,
    commodity:     Option<String>,
    current_year:  i64,
    previous_year: i64,
  ) -> Result<Option<RegionalComparison>> {
    let (region_q, commodity_q) = (region_code.clone(), commodity.clone());
    let (current, previous) = self
      .conn
      .call(move |conn| {
        let current = queries::regional_mean(conn, &region_q, commodity_q.as_deref(), current_year)?;
        let previous =
          queries::regional_mean(conn, &region_q, commodity_q.as_deref(), previous_year)?;
        Ok((current, previous))
      })
      .await?;

    let (Some(current_avg_wapr), Some(previous_avg_wapr)) = (current, previous) else {
      return Ok(None);
    };
    let delta = current_avg_wapr - previous_avg_wapr;

    Ok(Some(RegionalComparison {
      region_code,
      commodity,
      current_year,
      previous_year,
      current_avg_wapr,
      previous_avg_wapr,
      delta,
      percent_change: percent_change(delta, previous_avg_wapr),
      direction: Direction::classify(delta),
    }))
  }

  // ── Similar years and yield ───────────────────────────────────────────────

  async fn most_similar_year(&self, commodity: String, scope: Scope) -> Result<Option<SimilarYear>> {
    let row = self
      .conn
      .call(move |conn| Ok(queries::most_similar_year(conn, &commodity, scope.country_code())?))
      .await?;

    Ok(row.map(|(commodity, country_code, country_name, record)| SimilarYear {
      commodity,
      country_code,
      country_name,
      record,
    }))
  }

  async fn yield_risk_relation(&self, commodity: String, scope: Scope) -> Result<Option<YieldRisk>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(queries::yield_risk_relation(conn, &commodity, scope.country_code())?)
        })
        .await?,
    )
  }

  // ── Global aggregates ─────────────────────────────────────────────────────

  async fn global_average(
    &self,
    commodity: String,
    year:      i64,
    month:     u32,
  ) -> Result<Option<GlobalAverage>> {
    let commodity_q = commodity.clone();
    let row = self
      .conn
      .call(move |conn| Ok(queries::global_avg_max(conn, &commodity_q, year)?))
      .await?;

    let Some((Some(global_avg_wapr), global_max_wapr)) = row else {
      return Ok(None);
    };

    Ok(Some(GlobalAverage {
      commodity,
      year,
      month,
      global_avg_wapr,
      global_max_wapr,
      region: GLOBAL_NAME.to_owned(),
    }))
  }

  async fn max_risk_trend(
    &self,
    commodity:  String,
    scope:      Scope,
    start_year: i64,
    end_year:   i64,
  ) -> Result<Vec<TrendPoint>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(queries::max_risk_trend(
            conn,
            &commodity,
            scope.country_code(),
            start_year,
            end_year,
          )?)
        })
        .await?,
    )
  }

  async fn upcoming_spikes(&self, commodity: String, threshold: f64) -> Result<Vec<SpikeRegion>> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(queries::upcoming_spikes(conn, &commodity, threshold)?))
        .await?,
    )
  }
}
