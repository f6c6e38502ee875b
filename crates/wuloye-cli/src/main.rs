//! `wuloye`: developer tooling for the Wuloye backend.
//!
//! # Usage
//!
//! ```text
//! wuloye health
//! wuloye test-token alice@example.com hunter2 --api-key <web api key>
//! wuloye profile                      # uses .test-token.txt
//! wuloye service-account-env serviceAccountKey.json >> .env
//! ```

mod client;
mod firebase;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use client::ApiClient;
use firebase::{IdentityToolkit, ServiceAccount};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:5000";
const TOKEN_FILE: &str = ".test-token.txt";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "wuloye", about = "Developer tooling for the Wuloye backend")]
struct Args {
  /// Path to a TOML config file (url, api_key).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the Wuloye server (default: http://localhost:5000).
  #[arg(long, env = "WULOYE_URL", global = true)]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Call `GET /api/health`.
  Health,

  /// Call `GET /api/profile` with an ID token.
  Profile {
    /// The ID token. Read from `--token-file` when omitted.
    #[arg(long, env = "WULOYE_TOKEN")]
    token: Option<String>,

    #[arg(long, default_value = TOKEN_FILE)]
    token_file: PathBuf,
  },

  /// Sign in with email and password and save a test ID token.
  TestToken {
    #[arg(env = "FIREBASE_TEST_EMAIL")]
    email: String,

    #[arg(env = "FIREBASE_TEST_PASSWORD")]
    password: String,

    /// Firebase Web API key (Project Settings, General).
    #[arg(long, env = "FIREBASE_WEB_API_KEY")]
    api_key: Option<String>,

    #[arg(long, default_value = TOKEN_FILE)]
    token_file: PathBuf,
  },

  /// Print the server's environment variables from a service-account file.
  ServiceAccountEnv {
    #[arg(default_value = "serviceAccountKey.json")]
    path: PathBuf,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:     String,
  #[serde(default)]
  api_key: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());

  match args.command {
    Command::Health => {
      let body = ApiClient::new(&base_url)?.health().await?;
      println!("{}", serde_json::to_string_pretty(&body)?);
    }

    Command::Profile { token, token_file } => {
      let token = match token {
        Some(t) => t,
        None => std::fs::read_to_string(&token_file)
          .with_context(|| {
            format!(
              "no --token given and {} unreadable (run `wuloye test-token` first)",
              token_file.display()
            )
          })?
          .trim()
          .to_string(),
      };

      let (status, envelope) = ApiClient::new(&base_url)?.profile(&token).await?;
      println!("{status}: {}", envelope.message);
      if let Some(profile) = &envelope.data {
        println!("{}", serde_json::to_string_pretty(profile)?);
      }
      if let Some(stack) = &envelope.stack {
        eprintln!("{stack}");
      }
      if !envelope.success {
        return Err(anyhow!("request failed with {status}"));
      }
    }

    Command::TestToken {
      email,
      password,
      api_key,
      token_file,
    } => {
      let api_key = api_key
        .or_else(|| (!file_cfg.api_key.is_empty()).then(|| file_cfg.api_key.clone()))
        .ok_or_else(|| anyhow!("no Web API key: pass --api-key or set FIREBASE_WEB_API_KEY"))?;

      tracing::info!(%email, "signing in to Firebase");
      let signed = IdentityToolkit::new(api_key)?
        .sign_in_with_password(&email, &password)
        .await?;

      println!("UID:            {}", signed.local_id);
      println!("Email:          {}", signed.email);
      if let Some(verified) = signed.email_verified {
        println!("Email verified: {verified}");
      }
      println!("\nID token:\n{}\n", signed.id_token);
      println!(
        "curl -H \"Authorization: Bearer {}\" {}/api/profile",
        signed.id_token,
        base_url.trim_end_matches('/')
      );

      // Saving is best-effort; the token has already been printed.
      match std::fs::write(&token_file, &signed.id_token) {
        Ok(()) => println!("\nToken saved to {}", token_file.display()),
        Err(e) => tracing::warn!("could not save token to {}: {e}", token_file.display()),
      }
    }

    Command::ServiceAccountEnv { path } => {
      let account = ServiceAccount::from_file(&path)?;
      print!("{}", account.env_lines()?);
    }
  }

  Ok(())
}
