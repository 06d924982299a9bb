//! Core types and trait definitions for the croprisk climate-risk store.
//!
//! This crate has no HTTP or database dependencies.
//! The storage backend, the ingestion orchestrator and the CLI all depend on
//! it; it depends on nothing but serde and chrono.

// Native `async fn` in traits; the store trait spells out `Send` bounds itself.
#![allow(async_fn_in_trait)]

pub mod coerce;
pub mod entity;
pub mod error;
pub mod metrics;
pub mod query;
pub mod record;
pub mod store;

pub use error::{Error, Result};
