//! The `IdentityVerifier` trait.

use std::future::Future;

use thiserror::Error;

use crate::claims::Claims;

/// The only failure a verifier reports to its caller.
///
/// Malformed, expired and badly signed tokens all collapse into this one
/// value; implementations log the underlying reason themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid credential")]
pub struct InvalidCredential;

/// Validates an opaque bearer credential against an external authority.
pub trait IdentityVerifier: Send + Sync {
  /// Verify the raw token (without the `Bearer ` prefix).
  fn verify<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Claims, InvalidCredential>> + Send + 'a;
}
