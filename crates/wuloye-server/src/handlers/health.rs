//! `GET /api/health`: liveness for load balancers and uptime checks.

use axum::{Json, extract::State};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use wuloye_core::{DocumentStore, IdentityVerifier};

use crate::{AppState, Environment};

pub const STATUS: &str = "Wuloye Backend Running";

/// Not wrapped in the envelope.
#[derive(Debug, Serialize)]
pub struct Health {
  pub status:      &'static str,
  pub timestamp:   String,
  pub environment: Environment,
}

pub async fn get<S, V>(State(state): State<AppState<S, V>>) -> Json<Health>
where
  S: DocumentStore + 'static,
  V: IdentityVerifier + 'static,
{
  Json(Health {
    status:      STATUS,
    timestamp:   Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    environment: state.config.environment,
  })
}
