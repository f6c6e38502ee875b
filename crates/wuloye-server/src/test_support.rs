//! Test doubles shared by the unit and router tests.

use std::{
  collections::HashMap,
  io,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use serde_json::Value;
use wuloye_core::{Claims, DocumentStore, IdentityVerifier, InvalidCredential};
use wuloye_store_sqlite::SqliteStore;

/// Accepts exactly the tokens it was given and counts every call.
#[derive(Default)]
pub struct StaticVerifier {
  tokens: HashMap<String, Claims>,
  calls:  AtomicUsize,
}

impl StaticVerifier {
  pub fn with_token(mut self, token: &str, claims: Claims) -> Self {
    self.tokens.insert(token.to_owned(), claims);
    self
  }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl IdentityVerifier for StaticVerifier {
  async fn verify(&self, token: &str) -> Result<Claims, InvalidCredential> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.tokens.get(token).cloned().ok_or(InvalidCredential)
  }
}

/// An in-memory SQLite store that records how often it was touched.
#[derive(Clone)]
pub struct SpyStore {
  inner:   SqliteStore,
  touches: Arc<AtomicUsize>,
}

impl SpyStore {
  pub async fn new() -> Self {
    Self {
      inner:   SqliteStore::open_in_memory().await.unwrap(),
      touches: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn touches(&self) -> usize { self.touches.load(Ordering::SeqCst) }

  pub fn inner(&self) -> &SqliteStore { &self.inner }

  fn touch(&self) { self.touches.fetch_add(1, Ordering::SeqCst); }
}

impl DocumentStore for SpyStore {
  type Error = wuloye_store_sqlite::Error;

  async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, Self::Error> {
    self.touch();
    self.inner.get(collection, id).await
  }

  async fn set(&self, collection: &str, id: &str, document: Value) -> Result<(), Self::Error> {
    self.touch();
    self.inner.set(collection, id, document).await
  }

  async fn create(&self, collection: &str, id: &str, document: Value) -> Result<bool, Self::Error> {
    self.touch();
    self.inner.create(collection, id, document).await
  }
}

/// A store whose backend is always unreachable.
pub struct DownStore;

impl DocumentStore for DownStore {
  type Error = io::Error;

  async fn get(&self, _: &str, _: &str) -> Result<Option<Value>, io::Error> {
    Err(io::Error::new(io::ErrorKind::ConnectionRefused, "document store unreachable"))
  }

  async fn set(&self, _: &str, _: &str, _: Value) -> Result<(), io::Error> {
    Err(io::Error::new(io::ErrorKind::ConnectionRefused, "document store unreachable"))
  }
}
