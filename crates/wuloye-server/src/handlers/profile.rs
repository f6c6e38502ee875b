//! `GET /api/profile`: the caller's profile, created on first login.

use axum::{Json, extract::State};
use wuloye_core::{DocumentStore, IdentityVerifier, Profile};

use crate::{AppState, auth::VerifiedClaims, envelope::Envelope, error::ApiError};

pub const RETRIEVED: &str = "Profile retrieved successfully";

/// Must sit behind [`authenticate`](crate::auth::authenticate). Failures go
/// to the error normaliser untouched.
pub async fn get<S, V>(
  State(state): State<AppState<S, V>>,
  VerifiedClaims(claims): VerifiedClaims,
) -> Result<Json<Envelope<Profile>>, ApiError>
where
  S: DocumentStore + 'static,
  V: IdentityVerifier + 'static,
{
  let profile = state.profiles.find_or_create(&claims).await?;
  Ok(Json(Envelope::ok(profile, RETRIEVED)))
}
