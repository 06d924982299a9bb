//! Entity resolution: natural key in, surrogate id out.
//!
//! Lookup, insert on miss, then look up again. A failed insert is ignored:
//! it means another writer created the row first, and the second lookup is
//! authoritative either way.

use croprisk_core::entity::{CountryRef, slugify};
use rusqlite::{Connection, OptionalExtension as _};

fn commodity_id(conn: &Connection, name: &str) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row(
      "SELECT id FROM commodities WHERE name = ?1",
      rusqlite::params![name],
      |r| r.get(0),
    )
    .optional()
}

fn country_id(conn: &Connection, code: &str) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row(
      "SELECT id FROM countries WHERE code = ?1",
      rusqlite::params![code],
      |r| r.get(0),
    )
    .optional()
}

/// `None` only if the row could be neither found nor created.
pub fn resolve_commodity(conn: &Connection, name: &str) -> rusqlite::Result<Option<i64>> {
  match commodity_id(conn, name)? {
    Some(id) => Ok(Some(id)),
    None => create_commodity(conn, name),
  }
}

/// `None` only if the row could be neither found nor created.
pub fn resolve_country(conn: &Connection, country: &CountryRef) -> rusqlite::Result<Option<i64>> {
  match country_id(conn, &country.code)? {
    Some(id) => Ok(Some(id)),
    None => create_country(conn, country),
  }
}

// Called after a missed lookup. A concurrent resolver may have inserted the
// row in between; the re-query settles it either way.

fn create_commodity(conn: &Connection, name: &str) -> rusqlite::Result<Option<i64>> {
  let _ = conn.execute(
    "INSERT INTO commodities (name, slug) VALUES (?1, ?2)",
    rusqlite::params![name, slugify(name)],
  );
  commodity_id(conn, name)
}

fn create_country(conn: &Connection, country: &CountryRef) -> rusqlite::Result<Option<i64>> {
  let _ = conn.execute(
    "INSERT INTO countries (code, name) VALUES (?1, ?2)",
    rusqlite::params![country.code, country.name],
  );
  country_id(conn, &country.code)
}
