//! Developer helpers that talk to Firebase directly: password sign-in for a
//! test ID token, and reading a service-account key file.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
  email:               &'a str,
  password:            &'a str,
  return_secure_token: bool,
}

/// The fields of `accounts:signInWithPassword` we use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignIn {
  pub local_id:       String,
  pub email:          String,
  pub id_token:       String,
  #[serde(default)]
  pub email_verified: Option<bool>,
}

/// Email/password sign-in against the Identity Toolkit REST API.
pub struct IdentityToolkit {
  client:   Client,
  base_url: String,
  api_key:  String,
}

impl IdentityToolkit {
  pub fn new(api_key: impl Into<String>) -> Result<Self> {
    Self::with_base_url(IDENTITY_TOOLKIT_URL, api_key)
  }

  pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      base_url: base_url.into(),
      api_key: api_key.into(),
    })
  }

  /// Exchange an email and password for an ID token.
  pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<SignIn> {
    let url = format!(
      "{}/accounts:signInWithPassword",
      self.base_url.trim_end_matches('/')
    );
    let resp = self
      .client
      .post(url)
      .query(&[("key", self.api_key.as_str())])
      .json(&SignInRequest {
        email,
        password,
        return_secure_token: true,
      })
      .send()
      .await
      .context("signInWithPassword request failed")?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(anyhow!("authentication failed ({status}): {body}"));
    }
    resp.json().await.context("deserialising sign-in response")
  }
}

// ─── Service account ──────────────────────────────────────────────────────────

/// The part of a Firebase service-account key file the server needs.
#[derive(Debug, Deserialize)]
pub struct ServiceAccount {
  #[serde(default)]
  pub project_id: String,
}

impl ServiceAccount {
  pub fn from_file(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading service account file {}", path.display()))?;
    serde_json::from_str(&raw).context("parsing service account JSON")
  }

  /// Lines ready to paste into an `.env` file.
  pub fn env_lines(&self) -> Result<String> {
    if self.project_id.is_empty() {
      return Err(anyhow!("service account file has no project_id"));
    }
    Ok(format!("WULOYE_FIREBASE_PROJECT_ID={}\n", self.project_id))
  }
}
