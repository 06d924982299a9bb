//! HTTP client for the upstream feeds.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Fetches feed bodies. Cheap to clone: the inner [`reqwest::Client`] is
/// `Arc`-based.
#[derive(Clone)]
pub struct FeedClient {
  client: Client,
}

impl FeedClient {
  /// A client whose every request is bounded by `timeout`.
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client })
  }

  /// `GET url`, expecting a JSON array of records.
  pub async fn fetch(&self, url: &str) -> Result<Vec<Value>> {
    let resp = self.client.get(url).send().await?;

    if !resp.status().is_success() {
      return Err(Error::Status { url: url.to_owned(), status: resp.status() });
    }

    match resp.json::<Value>().await? {
      Value::Array(items) => Ok(items),
      _ => Err(Error::NotAnArray { url: url.to_owned() }),
    }
  }
}
