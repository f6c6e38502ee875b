//! [`FirebaseVerifier`], the Firebase implementation of [`IdentityVerifier`].

use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use tokio::sync::RwLock;
use wuloye_core::{Claims, IdentityVerifier, InvalidCredential};

use crate::{
  Error, Result,
  keys::{self, JwkSet, KeyCache},
  token::FirebaseTokenClaims,
};

/// Google's public keys for Firebase ID tokens, in JWK format.
pub const FIREBASE_JWKS_URL: &str =
  "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Used when the key endpoint sends no `Cache-Control: max-age`.
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(60 * 60);
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Clock skew tolerated on `exp`, `iat` and `auth_time`, in seconds.
const LEEWAY_SECS: u64 = 60;

enum KeySource {
  Remote { client: reqwest::Client, url: String },
  Fixed,
}

/// What the cache can say about a `kid` without fetching.
enum Lookup {
  Hit(DecodingKey),
  Miss,
  Refresh,
}

/// Verifies Firebase Authentication ID tokens for one project.
///
/// Public keys are fetched lazily and cached for as long as the key
/// endpoint's `Cache-Control` allows. A token naming an unknown `kid`
/// triggers a refresh, which covers Google's key rotation. Fetches are
/// attempted at most once per refetch interval; if a refresh fails, the
/// previous keys keep being served.
pub struct FirebaseVerifier {
  project_id:  String,
  issuer:      String,
  source:      KeySource,
  cache:       RwLock<KeyCache>,
  default_ttl: Duration,
  min_refetch: Duration,
}

impl FirebaseVerifier {
  /// A verifier for `project_id` using Google's public key endpoint.
  pub fn new(project_id: impl Into<String>) -> Result<Self> {
    Self::with_jwks_url(project_id, FIREBASE_JWKS_URL)
  }

  /// A verifier fetching keys from `url` instead, e.g. an emulator.
  pub fn with_jwks_url(project_id: impl Into<String>, url: impl Into<String>) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    Ok(Self::build(
      project_id.into(),
      KeySource::Remote {
        client,
        url: url.into(),
      },
      KeyCache::empty(),
    ))
  }

  /// A verifier that trusts exactly the keys in `set` and never fetches.
  pub fn with_keys(project_id: impl Into<String>, set: &JwkSet) -> Result<Self> {
    let cache = KeyCache::from_set(set, None);
    if cache.is_empty() {
      return Err(Error::NoUsableKeys);
    }
    Ok(Self::build(project_id.into(), KeySource::Fixed, cache))
  }

  fn build(project_id: String, source: KeySource, cache: KeyCache) -> Self {
    Self {
      issuer: format!("https://securetoken.google.com/{project_id}"),
      project_id,
      source,
      cache: RwLock::new(cache),
      default_ttl: DEFAULT_KEY_TTL,
      min_refetch: MIN_REFETCH_INTERVAL,
    }
  }

  /// Override the key lifetime used without `max-age` and the minimum time
  /// between fetch attempts.
  #[cfg(test)]
  pub(crate) fn with_refresh_policy(mut self, default_ttl: Duration, min_refetch: Duration) -> Self {
    self.default_ttl = default_ttl;
    self.min_refetch = min_refetch;
    self
  }

  pub fn project_id(&self) -> &str { &self.project_id }

  /// Full verification with a descriptive error. Prefer
  /// [`IdentityVerifier::verify`] at trust boundaries.
  pub async fn verify_token(&self, token: &str) -> Result<Claims> {
    let header = decode_header(token).map_err(Error::Malformed)?;
    if header.alg != Algorithm::RS256 {
      return Err(Error::UnsupportedAlgorithm(header.alg));
    }
    let kid = header.kid.ok_or(Error::MissingKeyId)?;
    let key = self.key_for(&kid).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = LEEWAY_SECS;
    validation.set_audience(&[&self.project_id]);
    validation.set_issuer(&[&self.issuer]);
    validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);

    let data =
      decode::<FirebaseTokenClaims>(token, &key, &validation).map_err(Error::Rejected)?;
    data
      .claims
      .into_claims(Utc::now().timestamp(), LEEWAY_SECS as i64)
  }

  fn lookup(&self, cache: &KeyCache, kid: &str) -> Lookup {
    let now = Instant::now();
    let cached = cache.get(kid);
    if cache.is_fresh(now)
      && let Some(key) = cached
    {
      return Lookup::Hit(key.clone());
    }
    if matches!(self.source, KeySource::Fixed) || !cache.may_refetch(now, self.min_refetch) {
      // Fetching is on hold: serve whatever is cached, stale or not.
      return match cached {
        Some(key) => Lookup::Hit(key.clone()),
        None => Lookup::Miss,
      };
    }
    Lookup::Refresh
  }

  fn miss(&self, cache: &KeyCache, kid: &str) -> Error {
    if cache.is_empty() && matches!(self.source, KeySource::Remote { .. }) {
      Error::KeysUnavailable
    } else {
      Error::UnknownKeyId(kid.to_owned())
    }
  }

  async fn key_for(&self, kid: &str) -> Result<DecodingKey> {
    {
      let cache = self.cache.read().await;
      match self.lookup(&cache, kid) {
        Lookup::Hit(key) => return Ok(key),
        Lookup::Miss => return Err(self.miss(&cache, kid)),
        Lookup::Refresh => {}
      }
    }

    let KeySource::Remote { client, url } = &self.source else {
      return Err(Error::UnknownKeyId(kid.to_owned()));
    };

    let mut cache = self.cache.write().await;

    // Another request may have refreshed while this one waited for the lock.
    match self.lookup(&cache, kid) {
      Lookup::Hit(key) => return Ok(key),
      Lookup::Miss => return Err(self.miss(&cache, kid)),
      Lookup::Refresh => {}
    }

    cache.mark_attempt(Instant::now());
    let refreshed = keys::fetch(client, url, self.default_ttl)
      .await
      .and_then(|(set, ttl)| {
        let fresh = KeyCache::from_set(&set, Some(ttl));
        if fresh.is_empty() { Err(Error::NoUsableKeys) } else { Ok((fresh, ttl)) }
      });

    match refreshed {
      Ok((fresh, ttl)) => {
        *cache = fresh;
        tracing::debug!(
          keys = cache.len(),
          ttl_secs = ttl.as_secs(),
          "refreshed identity provider keys"
        );
      }
      Err(e) => {
        if let Some(key) = cache.get(kid) {
          tracing::warn!(error = %e, "key refresh failed; serving cached keys");
          return Ok(key.clone());
        }
        return Err(e);
      }
    }

    cache
      .get(kid)
      .cloned()
      .ok_or_else(|| Error::UnknownKeyId(kid.to_owned()))
  }
}

impl IdentityVerifier for FirebaseVerifier {
  async fn verify(&self, token: &str) -> Result<Claims, InvalidCredential> {
    self.verify_token(token).await.map_err(|e| {
      if e.is_key_source_failure() {
        tracing::warn!(error = %e, "could not load identity provider keys");
      } else {
        tracing::debug!(error = %e, "rejected bearer token");
      }
      InvalidCredential
    })
  }
}
