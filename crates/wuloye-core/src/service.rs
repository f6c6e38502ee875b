//! Profile provisioning: find-or-create on first login, plus plain lookups.

use std::sync::Arc;

use chrono::Utc;

use crate::{
  claims::Claims,
  error::{Error, Result},
  profile::Profile,
  store::DocumentStore,
};

/// Collection holding one document per subject, keyed by subject.
pub const PROFILES_COLLECTION: &str = "users";

/// The single writer of [`Profile`] documents.
///
/// Cheap to clone; the store is shared behind an [`Arc`].
pub struct ProfileService<S> {
  store: Arc<S>,
}

impl<S> Clone for ProfileService<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

impl<S: DocumentStore> ProfileService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Return the profile for `claims.subject`, creating it on first sight.
  ///
  /// An existing profile is returned exactly as stored, even if the claims
  /// now carry a different email or display name. A new profile is written
  /// with a conditional create; if another request created it first, the
  /// stored winner is returned instead of the locally built value.
  pub async fn find_or_create(&self, claims: &Claims) -> Result<Profile> {
    if let Some(existing) = self.get_by_id(&claims.subject).await? {
      return Ok(existing);
    }

    let profile = Profile::from_claims(claims, Utc::now());
    let created = self
      .store
      .create(
        PROFILES_COLLECTION,
        &profile.subject,
        serde_json::to_value(&profile)?,
      )
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    if created {
      tracing::info!(subject = %profile.subject, "created profile on first login");
      return Ok(profile);
    }

    tracing::debug!(
      subject = %profile.subject,
      "profile created concurrently, returning stored document"
    );
    self
      .get_by_id(&profile.subject)
      .await?
      .ok_or(Error::ProfileVanished(profile.subject))
  }

  /// Look a profile up by subject. Returns `None` if it does not exist.
  pub async fn get_by_id(&self, subject: &str) -> Result<Option<Profile>> {
    let document = self
      .store
      .get(PROFILES_COLLECTION, subject)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    document
      .map(serde_json::from_value)
      .transpose()
      .map_err(Error::from)
  }
}
