//! The persisted per-subject record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claims::Claims;

/// One profile exists per distinct subject.
///
/// `email` and `display_name` are snapshots taken when the profile was first
/// created; later logins never refresh them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub subject:      String,
  pub email:        Option<String>,
  pub display_name: Option<String>,
  pub created_at:   DateTime<Utc>,
}

impl Profile {
  /// Build a fresh profile from verified claims.
  pub fn from_claims(claims: &Claims, created_at: DateTime<Utc>) -> Self {
    Self {
      subject: claims.subject.clone(),
      email: claims.email.clone(),
      display_name: claims.display_name.clone(),
      created_at,
    }
  }
}
