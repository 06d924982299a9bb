//! SQL schema for the croprisk SQLite store.
//!
//! Executed at every connection startup; idempotent thanks to
//! `CREATE ... IF NOT EXISTS`. Future migrations will be gated on
//! `PRAGMA user_version`.

use std::time::Duration;

/// How long a write waits on another in-flight write before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS commodities (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    slug TEXT NOT NULL            -- fixed at creation
);

CREATE TABLE IF NOT EXISTS countries (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,    -- ISO-like, 'GLB', or derived from a name
    name TEXT NOT NULL
);

-- Season flags are 0, 1 or NULL throughout.

CREATE TABLE IF NOT EXISTS climate_risk_by_country (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    source_key         TEXT,
    commodity_id       INTEGER NOT NULL REFERENCES commodities(id),
    country_id         INTEGER NOT NULL REFERENCES countries(id),
    year               INTEGER NOT NULL,
    hist_avg_wapr      REAL,
    this_year_avg_wapr REAL,
    current_season     INTEGER CHECK (current_season IN (0, 1)),
    most_recent_season INTEGER CHECK (most_recent_season IN (0, 1)),
    upcoming_season    INTEGER CHECK (upcoming_season IN (0, 1)),
    just_ended_season  INTEGER CHECK (just_ended_season IN (0, 1)),
    UNIQUE (commodity_id, country_id, year)
);

-- Latest snapshot per pair; no year dimension.
CREATE TABLE IF NOT EXISTS risk_compared_hist_box (
    id                       INTEGER PRIMARY KEY AUTOINCREMENT,
    source_key               TEXT,
    commodity_id             INTEGER NOT NULL REFERENCES commodities(id),
    country_id               INTEGER NOT NULL REFERENCES countries(id),
    hist_risk_score          REAL,
    this_year_risk_score     REAL,
    avg_risk_score_diff      REAL,
    upcoming_year_risk_score REAL,
    risk_level               TEXT,
    current_season           INTEGER CHECK (current_season IN (0, 1)),
    just_ended_season        INTEGER CHECK (just_ended_season IN (0, 1)),
    upcoming_season          INTEGER CHECK (upcoming_season IN (0, 1)),
    UNIQUE (commodity_id, country_id)
);

CREATE TABLE IF NOT EXISTS risk_current_vs_hist (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    source_key     TEXT,
    commodity_id   INTEGER NOT NULL REFERENCES commodities(id),
    country_id     INTEGER NOT NULL REFERENCES countries(id),
    date_on        TEXT NOT NULL,
    hist_wapr      REAL,
    this_year_wapr REAL,
    std_upper      REAL,
    std_lower      REAL,
    season_status  TEXT,
    UNIQUE (commodity_id, country_id, date_on)
);

CREATE TABLE IF NOT EXISTS risk_global_avg_max (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    source_key      TEXT,
    commodity_id    INTEGER NOT NULL REFERENCES commodities(id),
    country_id      INTEGER NOT NULL REFERENCES countries(id),
    year            INTEGER NOT NULL,
    hist_max_wapr   REAL,
    hist_avg_wapr   REAL,
    current_season  INTEGER CHECK (current_season IN (0, 1)),
    past_season     INTEGER CHECK (past_season IN (0, 1)),
    upcoming_season INTEGER CHECK (upcoming_season IN (0, 1)),
    UNIQUE (commodity_id, country_id, year)
);

CREATE TABLE IF NOT EXISTS most_similar_year (
    id                                 INTEGER PRIMARY KEY AUTOINCREMENT,
    source_key                         TEXT,
    commodity_id                       INTEGER NOT NULL REFERENCES commodities(id),
    country_id                         INTEGER NOT NULL REFERENCES countries(id),
    this_growing_season_year           INTEGER NOT NULL,
    most_similar_growing_season_year   INTEGER,
    hist_avg_wapr_of_most_similar_year REAL,
    risk_category                      TEXT,
    star_rating                        INTEGER,
    total_production                   REAL,
    total_production_unit              TEXT,
    total_area_harvested               REAL,
    total_area_harvested_unit          TEXT,
    total_yield                        REAL,
    total_yield_unit                   TEXT,
    yield_rating                       TEXT,
    current_season                     INTEGER CHECK (current_season IN (0, 1)),
    upcoming_season                    INTEGER CHECK (upcoming_season IN (0, 1)),
    just_ended_season                  INTEGER CHECK (just_ended_season IN (0, 1)),
    UNIQUE (commodity_id, country_id, this_growing_season_year)
);

-- Append-only audit trail. Duplicates are expected.
CREATE TABLE IF NOT EXISTS raw_ingest (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    endpoint_name TEXT NOT NULL,
    source_key    TEXT,
    payload       TEXT NOT NULL,   -- untouched source record, compact JSON
    ingested_at   TEXT NOT NULL    -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS raw_ingest_endpoint_idx ON raw_ingest(endpoint_name);
CREATE INDEX IF NOT EXISTS current_vs_hist_date_idx ON risk_current_vs_hist(date_on);

PRAGMA user_version = 1;
";
