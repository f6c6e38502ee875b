//! The `DocumentStore` trait.
//!
//! A document store is a set of named collections, each mapping a string id
//! to a JSON document. It is implemented by storage backends (e.g.
//! `wuloye-store-sqlite`); [`ProfileService`](crate::service::ProfileService)
//! depends only on this abstraction.

use std::future::Future;

use serde_json::Value;

/// Abstraction over a key-value-by-id document collection.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded tokio runtime.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the document stored at `collection/id`. Absence is `Ok(None)`.
  fn get<'a>(
    &'a self,
    collection: &'a str,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Write `document` at `collection/id`, replacing whatever was there.
  fn set<'a>(
    &'a self,
    collection: &'a str,
    id: &'a str,
    document: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Write `document` only if nothing is stored at `collection/id` yet.
  ///
  /// Returns `true` if the document was written and `false` if an existing
  /// document was left in place. The default body is a plain `get` followed
  /// by `set`, so two concurrent callers may both see `true` and the later
  /// write wins. Backends with a native conditional insert should override
  /// it.
  fn create<'a>(
    &'a self,
    collection: &'a str,
    id: &'a str,
    document: Value,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a {
    async move {
      if self.get(collection, id).await?.is_some() {
        return Ok(false);
      }
      self.set(collection, id, document).await?;
      Ok(true)
    }
  }
}
