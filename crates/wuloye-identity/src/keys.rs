//! Public signing keys: the JWK set format and the in-process key cache.

use std::{
  collections::HashMap,
  time::{Duration, Instant},
};

use jsonwebtoken::DecodingKey;
use reqwest::header::{CACHE_CONTROL, HeaderMap};
use serde::Deserialize;

use crate::{Error, Result};

/// A JSON Web Key Set as served by Google's key endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
  pub keys: Vec<Jwk>,
}

/// A single JSON Web Key. Only RSA keys with a `kid` are used; others are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
  #[serde(default)]
  pub kid: Option<String>,
  #[serde(default)]
  pub kty: String,
  #[serde(default)]
  pub alg: Option<String>,
  /// RSA modulus, base64url.
  #[serde(default)]
  pub n:   String,
  /// RSA exponent, base64url.
  #[serde(default)]
  pub e:   String,
}

/// Decoded keys indexed by `kid`, with their freshness window.
pub(crate) struct KeyCache {
  keys:         HashMap<String, DecodingKey>,
  /// Last fetch attempt, successful or not.
  last_attempt: Option<Instant>,
  /// `None` means the keys never go stale (fixed key sets).
  expires_at:   Option<Instant>,
}

impl KeyCache {
  /// A cache that holds nothing and is already stale.
  pub(crate) fn empty() -> Self {
    Self {
      keys:         HashMap::new(),
      last_attempt: None,
      expires_at:   Some(Instant::now()),
    }
  }

  /// Decode the usable keys of `set`. Entries that are not RSA, have no
  /// `kid`, or carry undecodable components are skipped.
  pub(crate) fn from_set(set: &JwkSet, ttl: Option<Duration>) -> Self {
    let now = Instant::now();
    let mut keys = HashMap::with_capacity(set.keys.len());

    for jwk in set.keys.iter().filter(|k| k.kty == "RSA") {
      let Some(kid) = jwk.kid.as_deref() else {
        tracing::warn!("skipping RSA key without a kid");
        continue;
      };
      match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
        Ok(key) => {
          keys.insert(kid.to_owned(), key);
        }
        Err(e) => tracing::warn!(kid, error = %e, "skipping undecodable RSA key"),
      }
    }

    Self {
      keys,
      last_attempt: Some(now),
      expires_at: ttl.map(|ttl| now + ttl),
    }
  }

  pub(crate) fn get(&self, kid: &str) -> Option<&DecodingKey> { self.keys.get(kid) }

  pub(crate) fn is_fresh(&self, now: Instant) -> bool {
    self.expires_at.is_none_or(|at| now < at)
  }

  /// Whether another fetch may be made. At most one attempt per
  /// `min_interval`, whether the last one succeeded or failed, so neither
  /// bogus key ids nor a failing endpoint cause a fetch per request.
  pub(crate) fn may_refetch(&self, now: Instant, min_interval: Duration) -> bool {
    self
      .last_attempt
      .is_none_or(|at| now.duration_since(at) >= min_interval)
  }

  /// Record a fetch attempt that did not replace the cache.
  pub(crate) fn mark_attempt(&mut self, now: Instant) { self.last_attempt = Some(now); }

  pub(crate) fn len(&self) -> usize { self.keys.len() }

  pub(crate) fn is_empty(&self) -> bool { self.keys.is_empty() }
}

/// Download the key set at `url`, returning it with its cache lifetime.
pub(crate) async fn fetch(
  client: &reqwest::Client,
  url: &str,
  default_ttl: Duration,
) -> Result<(JwkSet, Duration)> {
  let resp = client.get(url).send().await?;
  if !resp.status().is_success() {
    return Err(Error::KeyFetchStatus(resp.status()));
  }
  let ttl = max_age(resp.headers()).unwrap_or(default_ttl);
  let set = resp.json::<JwkSet>().await?;
  Ok((set, ttl))
}

/// Parse `max-age=<secs>` out of a `Cache-Control` header.
pub(crate) fn max_age(headers: &HeaderMap) -> Option<Duration> {
  headers
    .get_all(CACHE_CONTROL)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .filter_map(|directive| directive.trim().strip_prefix("max-age="))
    .find_map(|secs| secs.trim().parse::<u64>().ok())
    .map(Duration::from_secs)
}
