//! Bearer-token authentication gate and the claims extractor.
//!
//! [`authenticate`] runs as route middleware in front of protected handlers.
//! It answers its own failures with a 401 envelope; they never reach the
//! error normaliser.

use axum::{
  Json,
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
  middleware::Next,
  response::{IntoResponse, Response},
};
use thiserror::Error;
use wuloye_core::{Claims, DocumentStore, IdentityVerifier, InvalidCredential};

use crate::{AppState, envelope::Envelope, error::ApiError};

const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was turned away at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthRejection {
  #[error("Unauthorized: missing or malformed Authorization header")]
  MissingOrMalformedHeader,
  #[error("Unauthorized: invalid or expired token")]
  InvalidToken,
}

impl IntoResponse for AuthRejection {
  fn into_response(self) -> Response {
    let mut res = (
      StatusCode::UNAUTHORIZED,
      Json(Envelope::failure(self.to_string())),
    )
      .into_response();
    res
      .headers_mut()
      .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    res
  }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is case-sensitive and followed by exactly one space; the
/// token is everything after it and must not be empty.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthRejection> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix(BEARER_PREFIX))
    .filter(|token| !token.is_empty())
    .ok_or(AuthRejection::MissingOrMalformedHeader)
}

/// Verify credentials directly from headers.
pub async fn verify_request<V: IdentityVerifier>(
  headers: &HeaderMap,
  verifier: &V,
) -> Result<Claims, AuthRejection> {
  let token = bearer_token(headers)?;
  verifier
    .verify(token)
    .await
    .map_err(|InvalidCredential| AuthRejection::InvalidToken)
}

/// Route middleware: attach verified [`Claims`] to the request extensions or
/// reject with 401.
pub async fn authenticate<S, V>(
  State(state): State<AppState<S, V>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: DocumentStore + 'static,
  V: IdentityVerifier + 'static,
{
  let verified = verify_request(req.headers(), state.verifier.as_ref()).await;
  match verified {
    Ok(claims) => {
      req.extensions_mut().insert(claims);
      next.run(req).await
    }
    Err(rejection) => rejection.into_response(),
  }
}

/// The claims the gate attached. Present in a handler means the request was
/// authenticated.
#[derive(Debug, Clone)]
pub struct VerifiedClaims(pub Claims);

impl<S> FromRequestParts<S> for VerifiedClaims
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Claims>()
      .cloned()
      .map(VerifiedClaims)
      .ok_or(ApiError::MissingClaims)
  }
}
