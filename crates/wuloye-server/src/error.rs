//! Error types, the not-found fallback and the centralised error normaliser.
//!
//! Handlers return [`ApiError`]; its `IntoResponse` writes the production
//! envelope and stashes an [`ErrorReport`] on the response. The
//! [`normalize_errors`] middleware then logs that report and, outside
//! production, adds the `stack` field to the body.

use axum::{
  Json,
  extract::{OriginalUri, Request, State},
  http::{Method, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{Environment, envelope::Envelope};

const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ApiError {
  /// An error that declares its own HTTP status.
  ///
  /// ```rust,ignore
  /// return Err(ApiError::Status { status: StatusCode::CONFLICT, message: "Profile locked".into() });
  /// ```
  #[error("{message}")]
  Status {
    status:  StatusCode,
    message: String,
  },

  #[error(transparent)]
  Core(#[from] wuloye_core::Error),

  /// A protected handler ran without the authentication gate in front of it.
  #[error("verified claims missing from request")]
  MissingClaims,
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Status { status, .. } => *status,
      ApiError::Core(_) | ApiError::MissingClaims => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

/// What went wrong, carried from [`ApiError::into_response`] to
/// [`normalize_errors`] in the response extensions.
#[derive(Debug, Clone)]
pub struct ErrorReport {
  pub message: String,
  /// Debug form plus the `source()` chain.
  pub detail:  String,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let mut message = self.to_string();
    if message.is_empty() {
      message = INTERNAL_SERVER_ERROR.to_owned();
    }

    let report = ErrorReport {
      message: message.clone(),
      detail:  error_chain(&self),
    };
    let mut res = (status, Json(Envelope::failure(message))).into_response();
    res.extensions_mut().insert(report);
    res
  }
}

fn error_chain(err: &dyn std::error::Error) -> String {
  let mut out = format!("{err:?}");
  let mut source = err.source();
  while let Some(cause) = source {
    out.push_str("\ncaused by: ");
    out.push_str(&cause.to_string());
    source = cause.source();
  }
  out
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Log every [`ApiError`] response with its request line, and attach the
/// error detail as `stack` unless running in production.
pub async fn normalize_errors(
  State(environment): State<Environment>,
  req: Request,
  next: Next,
) -> Response {
  let method = req.method().clone();
  let target = request_target(req.uri());

  let res = next.run(req).await;
  let Some(report) = res.extensions().get::<ErrorReport>().cloned() else {
    return res;
  };

  tracing::error!(
    %method,
    target = %target,
    status = res.status().as_u16(),
    detail = %report.detail,
    "{}",
    report.message
  );

  if environment.is_production() {
    return res;
  }

  let (mut parts, _) = res.into_parts();
  parts.headers.remove(header::CONTENT_LENGTH);
  let body = Envelope::failure(report.message).with_stack(report.detail);
  (parts, Json(body)).into_response()
}

// ─── Fallback ────────────────────────────────────────────────────────────────

/// 404 for anything no route matched (including a known path with the wrong
/// method).
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> Response {
  let message = format!("Route not found: {method} {}", request_target(&uri));
  (StatusCode::NOT_FOUND, Json(Envelope::failure(message))).into_response()
}

fn request_target(uri: &axum::http::Uri) -> String {
  uri
    .path_and_query()
    .map(|pq| pq.as_str().to_owned())
    .unwrap_or_else(|| uri.path().to_owned())
}
