//! The verified identity attached to a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity attributes produced by an [`IdentityVerifier`] from a bearer
/// token. Lives for the duration of one request and is never persisted.
///
/// [`IdentityVerifier`]: crate::verifier::IdentityVerifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// Stable, provider-assigned user identifier. Never empty.
  pub subject:        String,
  pub email:          Option<String>,
  pub display_name:   Option<String>,
  /// Provider metadata, passed through untouched.
  pub email_verified: Option<bool>,
  pub auth_time:      Option<DateTime<Utc>>,
}

impl Claims {
  /// Claims carrying only a subject.
  pub fn new(subject: impl Into<String>) -> Self {
    Self {
      subject:        subject.into(),
      email:          None,
      display_name:   None,
      email_verified: None,
      auth_time:      None,
    }
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.email = Some(email.into());
    self
  }

  pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
    self.display_name = Some(name.into());
    self
  }
}
