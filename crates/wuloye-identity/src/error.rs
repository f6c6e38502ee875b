//! Error type for `wuloye-identity`.
//!
//! These never reach an HTTP caller; the [`IdentityVerifier`] impl logs them
//! and reports a bare [`InvalidCredential`].
//!
//! [`IdentityVerifier`]: wuloye_core::IdentityVerifier
//! [`InvalidCredential`]: wuloye_core::InvalidCredential

use jsonwebtoken::Algorithm;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed token: {0}")]
  Malformed(#[source] jsonwebtoken::errors::Error),

  #[error("unsupported signing algorithm {0:?}")]
  UnsupportedAlgorithm(Algorithm),

  #[error("token header has no key id")]
  MissingKeyId,

  #[error("no public key with id {0:?}")]
  UnknownKeyId(String),

  #[error("token rejected: {0}")]
  Rejected(#[source] jsonwebtoken::errors::Error),

  #[error("invalid claim: {0}")]
  InvalidClaim(&'static str),

  #[error("failed to fetch public keys: {0}")]
  KeyFetch(#[from] reqwest::Error),

  #[error("public key endpoint returned {0}")]
  KeyFetchStatus(reqwest::StatusCode),

  #[error("key set contains no usable RSA keys")]
  NoUsableKeys,

  /// No keys are cached and the last fetch attempt was too recent to retry.
  #[error("public keys unavailable; waiting before the next fetch")]
  KeysUnavailable,
}

impl Error {
  /// `true` for failures of the key endpoint rather than of the token.
  pub fn is_key_source_failure(&self) -> bool {
    matches!(
      self,
      Error::KeyFetch(_)
        | Error::KeyFetchStatus(_)
        | Error::NoUsableKeys
        | Error::KeysUnavailable
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
