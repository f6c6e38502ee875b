//! [`SqliteStore`], the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use serde_json::Value;

use wuloye_core::store::DocumentStore;

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of documents in `collection`.
  pub async fn count(&self, collection: &str) -> Result<u64> {
    let collection = collection.to_owned();

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM documents WHERE collection = ?1",
          rusqlite::params![collection],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
    let collection = collection.to_owned();
    let id         = id.to_owned();

    let body: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            rusqlite::params![collection, id],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    body
      .map(|b| serde_json::from_str(&b))
      .transpose()
      .map_err(Error::from)
  }

  async fn set(&self, collection: &str, id: &str, document: Value) -> Result<()> {
    let collection = collection.to_owned();
    let id         = id.to_owned();
    let body       = document.to_string();
    let now        = Utc::now().to_rfc3339();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, id, body, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)
           ON CONFLICT (collection, id)
           DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
          rusqlite::params![collection, id, body, now],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  /// Atomic: a single `INSERT … ON CONFLICT DO NOTHING`, so of two racing
  /// creators exactly one sees `true`.
  async fn create(&self, collection: &str, id: &str, document: Value) -> Result<bool> {
    let collection = collection.to_owned();
    let id         = id.to_owned();
    let body       = document.to_string();
    let now        = Utc::now().to_rfc3339();

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO documents (collection, id, body, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)
           ON CONFLICT (collection, id) DO NOTHING",
          rusqlite::params![collection, id, body, now],
        )?)
      })
      .await?;

    Ok(inserted == 1)
  }
}
