//! Commodities and countries, the two dimensions every fact row hangs off.
//!
//! Both are created lazily the first time a feed mentions them and are never
//! renamed or deleted. Their surrogate ids are assigned by the store.

use serde::{Deserialize, Serialize};

/// Placeholder country code for global aggregates.
pub const GLOBAL_CODE: &str = "GLB";
/// Display name paired with [`GLOBAL_CODE`].
pub const GLOBAL_NAME: &str = "Global";

/// A tracked commodity. `name` is the natural key (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
  pub id:   i64,
  pub name: String,
  /// Derived from `name` at creation time only.
  pub slug: String,
}

/// A country or aggregate region. `code` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
  pub id:   i64,
  pub code: String,
  pub name: String,
}

/// Deterministic slug for a commodity name: lowercased, spaces become
/// underscores.
pub fn slugify(name: &str) -> String { name.to_lowercase().replace(' ', "_") }

// ─── Country policy ──────────────────────────────────────────────────────────

/// A country natural key plus the display name to use if it must be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRef {
  pub code: String,
  pub name: String,
}

impl CountryRef {
  pub fn global() -> Self {
    Self { code: GLOBAL_CODE.to_owned(), name: GLOBAL_NAME.to_owned() }
  }
}

/// What to do when a feed record carries no country code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryFallback {
  /// Attribute the record to the global aggregate.
  Global,
  /// Derive a code from the first three letters of the display name,
  /// uppercased; global if there is no display name either.
  DeriveFromName,
}

impl CountryFallback {
  /// Resolve the raw `(code, name)` pair of a feed record into the country
  /// it belongs to. The returned code is never empty.
  pub fn resolve(self, code: Option<&str>, name: Option<&str>) -> CountryRef {
    let code = code.map(str::trim).filter(|c| !c.is_empty());
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    if let Some(code) = code {
      return CountryRef {
        code: code.to_owned(),
        name: name.unwrap_or(code).to_owned(),
      };
    }

    match (self, name) {
      (Self::DeriveFromName, Some(name)) => CountryRef {
        code: name.to_uppercase().chars().take(3).collect(),
        name: name.to_owned(),
      },
      (Self::Global, Some(name)) => CountryRef {
        code: GLOBAL_CODE.to_owned(),
        name: name.to_owned(),
      },
      (_, None) => CountryRef::global(),
    }
  }
}
