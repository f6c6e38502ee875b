//! HTTP surface of the Wuloye backend.
//!
//! Exposes an axum [`Router`] with a public health check and a bearer-token
//! protected profile endpoint, backed by any [`DocumentStore`] and
//! [`IdentityVerifier`].

pub mod auth;
pub mod envelope;
pub mod error;
pub mod handlers;

#[cfg(test)]
mod test_support;

pub use error::ApiError;

use std::{fmt, path::PathBuf, sync::Arc};

use axum::{
  Router,
  http::{HeaderValue, Method, header},
  middleware,
  routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};
use wuloye_core::{DocumentStore, IdentityVerifier, ProfileService};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Operating mode. Controls whether error responses carry a `stack`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Development,
  Production,
}

impl Environment {
  pub fn is_production(self) -> bool { self == Environment::Production }

  pub fn as_str(self) -> &'static str {
    match self {
      Environment::Development => "development",
      Environment::Production => "production",
    }
  }
}

impl fmt::Display for Environment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `WULOYE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default)]
  pub environment:         Environment,
  /// Origins allowed to make credentialed cross-origin requests.
  #[serde(default)]
  pub allowed_origins:     Vec<String>,
  pub firebase_project_id: String,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
}

fn default_host() -> String { "0.0.0.0".to_owned() }

fn default_port() -> u16 { 5000 }

fn default_store_path() -> PathBuf { PathBuf::from("wuloye.db") }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers. Built once at startup;
/// every request sees the same store and verifier.
pub struct AppState<S: DocumentStore, V: IdentityVerifier> {
  pub profiles: ProfileService<S>,
  pub verifier: Arc<V>,
  pub config:   Arc<ServerConfig>,
}

impl<S: DocumentStore, V: IdentityVerifier> AppState<S, V> {
  pub fn new(store: S, verifier: V, config: ServerConfig) -> Self {
    Self {
      profiles: ProfileService::new(Arc::new(store)),
      verifier: Arc::new(verifier),
      config:   Arc::new(config),
    }
  }
}

impl<S: DocumentStore, V: IdentityVerifier> Clone for AppState<S, V> {
  fn clone(&self) -> Self {
    Self {
      profiles: self.profiles.clone(),
      verifier: Arc::clone(&self.verifier),
      config:   Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router.
pub fn router<S, V>(state: AppState<S, V>) -> Router
where
  S: DocumentStore + 'static,
  V: IdentityVerifier + 'static,
{
  let environment = state.config.environment;
  let cors = cors_layer(&state.config.allowed_origins);

  let protected = Router::new()
    .route("/profile", get(handlers::profile::get::<S, V>))
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      auth::authenticate::<S, V>,
    ));

  let api = Router::new()
    .route("/health", get(handlers::health::get::<S, V>))
    .merge(protected);

  Router::new()
    .nest("/api", api)
    .fallback(error::not_found)
    .method_not_allowed_fallback(error::not_found)
    .layer(middleware::from_fn_with_state(environment, error::normalize_errors))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Echo only the configured origins; requests without an `Origin` header are
/// unaffected.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
  let origins: Vec<HeaderValue> = origins
    .iter()
    .map(|o| o.trim())
    .filter(|o| !o.is_empty())
    .filter_map(|o| match HeaderValue::from_str(o) {
      Ok(v) if v != "*" => Some(v),
      _ => {
        tracing::warn!(origin = %o, "ignoring unusable CORS origin");
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(origins))
    .allow_credentials(true)
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use wuloye_core::{Claims, PROFILES_COLLECTION};

  use crate::test_support::{DownStore, SpyStore, StaticVerifier};

  fn config(environment: Environment) -> ServerConfig {
    ServerConfig {
      host:                "127.0.0.1".to_owned(),
      port:                5000,
      environment,
      allowed_origins:     vec!["https://app.wuloye.test".to_owned()],
      firebase_project_id: "wuloye-test".to_owned(),
      store_path:          PathBuf::from(":memory:"),
    }
  }

  fn verifier() -> StaticVerifier {
    StaticVerifier::default()
      .with_token(
        "token-u1",
        Claims::new("u1")
          .with_email("alice@example.com")
          .with_display_name("Alice"),
      )
      .with_token("token-u1-renamed", Claims::new("u1").with_email("new@example.com"))
  }

  async fn make_state(environment: Environment) -> AppState<SpyStore, StaticVerifier> {
    AppState::new(SpyStore::new().await, verifier(), config(environment))
  }

  async fn oneshot<S, V>(
    state: AppState<S, V>,
    method: &str,
    uri: &str,
    headers: Vec<(header::HeaderName, &str)>,
  ) -> Response
  where
    S: DocumentStore + 'static,
    V: IdentityVerifier + 'static,
  {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    router(state)
      .oneshot(builder.body(Body::empty()).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_needs_no_auth() {
    let state = make_state(Environment::Development).await;
    let resp = oneshot(state, "GET", "/api/health", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["status"], "Wuloye Backend Running");
    assert_eq!(body["environment"], "development");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
  }

  #[tokio::test]
  async fn health_reports_production_mode() {
    let state = make_state(Environment::Production).await;
    let body = json_body(oneshot(state, "GET", "/api/health", vec![]).await).await;
    assert_eq!(body["environment"], "production");
  }

  // ── Authentication gate ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn profile_without_header_is_401_and_handler_never_runs() {
    let state = make_state(Environment::Development).await;
    let resp = oneshot(state.clone(), "GET", "/api/profile", vec![]).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
      json_body(resp).await,
      json!({
        "success": false,
        "data":    null,
        "message": "Unauthorized: missing or malformed Authorization header",
      })
    );
    assert_eq!(state.profiles.store().touches(), 0);
    assert_eq!(state.verifier.calls(), 0);
  }

  #[tokio::test]
  async fn malformed_headers_are_401_without_verification() {
    let state = make_state(Environment::Development).await;
    for value in ["Basic dXNlcjpwYXNz", "bearer token-u1", "Bearer "] {
      let resp = oneshot(
        state.clone(),
        "GET",
        "/api/profile",
        vec![(header::AUTHORIZATION, value)],
      )
      .await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{value:?}");
    }
    assert_eq!(state.verifier.calls(), 0);
    assert_eq!(state.profiles.store().touches(), 0);
  }

  #[tokio::test]
  async fn invalid_token_is_401_and_handler_never_runs() {
    let state = make_state(Environment::Development).await;
    let resp = oneshot(
      state.clone(),
      "GET",
      "/api/profile",
      vec![(header::AUTHORIZATION, "Bearer forged")],
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    let body = json_body(resp).await;
    assert_eq!(body["message"], "Unauthorized: invalid or expired token");
    assert_eq!(body["data"], Value::Null);
    assert!(body.get("stack").is_none());
    assert_eq!(state.verifier.calls(), 1);
    assert_eq!(state.profiles.store().touches(), 0);
  }

  // ── Profile ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_login_creates_profile() {
    let state = make_state(Environment::Development).await;
    let resp = oneshot(
      state.clone(),
      "GET",
      "/api/profile",
      vec![(header::AUTHORIZATION, "Bearer token-u1")],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Profile retrieved successfully");
    assert_eq!(body["data"]["subject"], "u1");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["displayName"], "Alice");
    assert!(body["data"]["createdAt"].is_string());

    let stored = state
      .profiles
      .store()
      .inner()
      .get(PROFILES_COLLECTION, "u1")
      .await
      .unwrap()
      .expect("profile persisted under the subject");
    assert_eq!(stored, body["data"]);
  }

  #[tokio::test]
  async fn repeat_login_returns_the_stored_profile_unchanged() {
    let state = make_state(Environment::Development).await;
    let auth = vec![(header::AUTHORIZATION, "Bearer token-u1")];

    let first = json_body(oneshot(state.clone(), "GET", "/api/profile", auth.clone()).await).await;
    let second = json_body(oneshot(state.clone(), "GET", "/api/profile", auth).await).await;
    assert_eq!(first["data"], second["data"]);

    // Newer claims for the same subject do not refresh the snapshot.
    let renamed = json_body(
      oneshot(
        state.clone(),
        "GET",
        "/api/profile",
        vec![(header::AUTHORIZATION, "Bearer token-u1-renamed")],
      )
      .await,
    )
    .await;
    assert_eq!(renamed["data"], first["data"]);
    assert_eq!(state.profiles.store().inner().count(PROFILES_COLLECTION).await.unwrap(), 1);
  }

  // ── Error normalisation ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_route_is_404_envelope() {
    let state = make_state(Environment::Development).await;
    let resp = oneshot(state, "GET", "/api/nonexistent", vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body = json_body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["message"], "Route not found: GET /api/nonexistent");
  }

  #[tokio::test]
  async fn unknown_route_message_keeps_the_query_string() {
    let state = make_state(Environment::Development).await;
    let body = json_body(oneshot(state, "DELETE", "/nope?x=1", vec![]).await).await;
    assert_eq!(body["message"], "Route not found: DELETE /nope?x=1");
  }

  #[tokio::test]
  async fn wrong_method_on_known_path_is_404_envelope() {
    let state = make_state(Environment::Development).await;
    let resp = oneshot(state, "POST", "/api/health", vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["message"], "Route not found: POST /api/health");
  }

  async fn down_store_state(environment: Environment) -> AppState<DownStore, StaticVerifier> {
    AppState::new(DownStore, verifier(), config(environment))
  }

  #[tokio::test]
  async fn store_failure_is_500_with_stack_in_development() {
    let state = down_store_state(Environment::Development).await;
    let resp = oneshot(
      state,
      "GET",
      "/api/profile",
      vec![(header::AUTHORIZATION, "Bearer token-u1")],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["message"], "store error: document store unreachable");
    let stack = body["stack"].as_str().expect("stack outside production");
    assert!(stack.contains("caused by: document store unreachable"), "{stack}");
  }

  #[tokio::test]
  async fn store_failure_hides_stack_in_production() {
    let state = down_store_state(Environment::Production).await;
    let resp = oneshot(
      state,
      "GET",
      "/api/profile",
      vec![(header::AUTHORIZATION, "Bearer token-u1")],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(resp).await;
    assert_eq!(body["message"], "store error: document store unreachable");
    assert!(body.get("stack").is_none());
  }

  // ── CORS ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn configured_origin_is_echoed_with_credentials() {
    let state = make_state(Environment::Development).await;
    let resp = oneshot(
      state,
      "GET",
      "/api/health",
      vec![(header::ORIGIN, "https://app.wuloye.test")],
    )
    .await;
    assert_eq!(
      resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
      "https://app.wuloye.test"
    );
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
  }

  #[tokio::test]
  async fn unknown_origin_gets_no_cors_headers() {
    let state = make_state(Environment::Development).await;
    let resp = oneshot(
      state,
      "GET",
      "/api/health",
      vec![(header::ORIGIN, "https://evil.test")],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
  }

  #[test]
  fn wildcard_and_blank_origins_are_dropped() {
    // Would panic inside tower-http if "*" reached `AllowOrigin::list`.
    let _ = cors_layer(&["*".to_owned(), "  ".to_owned(), "https://ok.test".to_owned()]);
  }

  // ── Real verifier ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn firebase_token_provisions_profile_end_to_end() {
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use wuloye_identity::{FirebaseVerifier, JwkSet};

    let jwks: JwkSet = serde_json::from_str(include_str!(
      "../../wuloye-identity/src/testdata/test_jwks.json"
    ))
    .unwrap();
    let verifier = FirebaseVerifier::with_keys("wuloye-test", &jwks).unwrap();
    let state = AppState::new(SpyStore::new().await, verifier, config(Environment::Development));

    let now = chrono::Utc::now().timestamp();
    let mut jwt_header = Header::new(Algorithm::RS256);
    jwt_header.kid = Some("test-key-1".to_owned());
    let token = encode(
      &jwt_header,
      &json!({
        "iss":   "https://securetoken.google.com/wuloye-test",
        "aud":   "wuloye-test",
        "sub":   "firebase-uid-42",
        "iat":   now,
        "exp":   now + 600,
        "email": "bob@example.com",
      }),
      &EncodingKey::from_rsa_pem(include_bytes!(
        "../../wuloye-identity/src/testdata/test_rsa.pem"
      ))
      .unwrap(),
    )
    .unwrap();
    let bearer = format!("Bearer {token}");

    let resp = oneshot(
      state,
      "GET",
      "/api/profile",
      vec![(header::AUTHORIZATION, bearer.as_str())],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["data"]["subject"], "firebase-uid-42");
    assert_eq!(body["data"]["email"], "bob@example.com");
    assert_eq!(body["data"]["displayName"], Value::Null);
  }
}
