//! Async HTTP client wrapping the Wuloye JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use wuloye_core::Profile;

/// The response envelope as the client sees it.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
  pub success: bool,
  pub data:    Option<T>,
  pub message: String,
  #[serde(default)]
  pub stack:   Option<String>,
}

/// Async HTTP client for the Wuloye API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      base_url: base_url.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// `GET /api/health`
  pub async fn health(&self) -> Result<Value> {
    let resp = self
      .client
      .get(self.url("/health"))
      .send()
      .await
      .context("GET /health failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /health → {}", resp.status()));
    }
    resp.json().await.context("deserialising health")
  }

  /// `GET /api/profile`
  ///
  /// Non-2xx answers are still returned so the caller can show the
  /// server's message.
  pub async fn profile(&self, token: &str) -> Result<(StatusCode, Envelope<Profile>)> {
    let resp = self
      .client
      .get(self.url("/profile"))
      .bearer_auth(token)
      .send()
      .await
      .context("GET /profile failed")?;

    let status = resp.status();
    let envelope = resp.json().await.context("deserialising profile envelope")?;
    Ok((status, envelope))
  }
}
