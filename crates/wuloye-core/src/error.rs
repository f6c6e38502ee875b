//! Error types for `wuloye-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A concurrent create claimed the document, but it could not be read
  /// back afterwards.
  #[error("profile {0:?} was created concurrently but could not be read back")]
  ProfileVanished(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
