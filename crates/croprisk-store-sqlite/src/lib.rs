//! SQLite backend for the croprisk store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod queries;
mod resolve;
mod schema;
mod store;
mod upsert;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
