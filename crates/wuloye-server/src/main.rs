//! Wuloye backend server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `WULOYE_*` environment variables, opens the SQLite document store and
//! serves the API over HTTP.
//!
//! The only required setting is the Firebase project id:
//!
//! ```text
//! WULOYE_FIREBASE_PROJECT_ID=my-project cargo run -p wuloye-server --bin server
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use wuloye_identity::FirebaseVerifier;
use wuloye_server::{AppState, ServerConfig};
use wuloye_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Wuloye backend server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("WULOYE")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("allowed_origins"),
    )
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig (is WULOYE_FIREBASE_PROJECT_ID set?)")?;

  anyhow::ensure!(
    !server_cfg.firebase_project_id.trim().is_empty(),
    "firebase_project_id must not be empty"
  );

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let verifier = FirebaseVerifier::new(server_cfg.firebase_project_id.clone())
    .context("failed to build the Firebase token verifier")?;
  tracing::info!(project = verifier.project_id(), "verifying Firebase ID tokens");

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let environment = server_cfg.environment;
  if server_cfg.allowed_origins.is_empty() {
    tracing::warn!("no allowed_origins configured; browsers will be refused CORS");
  }

  let app = wuloye_server::router(AppState::new(store, verifier, server_cfg));

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Wuloye backend listening on http://{address} ({environment})");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("failed to listen for shutdown signal: {e}");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
