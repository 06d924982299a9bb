//! Feed ingestion for croprisk.
//!
//! Fetches each feed over HTTP and, record by record, appends the untouched
//! payload to the audit trail and merges the mapped fact row into any
//! [`croprisk_core::store::RiskStore`]. Feeds are processed one at a time.

pub mod client;
pub mod error;
pub mod mapping;
pub mod orchestrator;

pub use client::FeedClient;
pub use error::{Error, Result};
pub use orchestrator::{FeedOutcome, FeedSource, IngestReport, Ingestor};
