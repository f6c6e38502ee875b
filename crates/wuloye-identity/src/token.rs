//! Payload of a Firebase ID token and its mapping onto [`Claims`].

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use wuloye_core::Claims;

use crate::{Error, Result};

/// Firebase caps `sub` (the user's uid) at 128 characters.
const MAX_SUBJECT_LEN: usize = 128;

/// The claims of a Firebase ID token this service cares about.
///
/// `aud`, `iss` and `exp` are checked by `jsonwebtoken` during decoding and
/// are not repeated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseTokenClaims {
  pub sub:            String,
  /// Issued-at, seconds since the epoch.
  pub iat:            i64,
  /// Time the user authenticated, seconds since the epoch.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub auth_time:      Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email_verified: Option<bool>,
  /// Display name, only present if the user has set one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:           Option<String>,
}

impl FirebaseTokenClaims {
  /// Check the time and subject rules `jsonwebtoken` does not cover, then
  /// convert. `now` and `leeway` are in seconds.
  pub fn into_claims(self, now: i64, leeway: i64) -> Result<Claims> {
    if self.sub.is_empty() || self.sub.len() > MAX_SUBJECT_LEN {
      return Err(Error::InvalidClaim("sub"));
    }
    if self.iat > now + leeway {
      return Err(Error::InvalidClaim("iat"));
    }

    let auth_time = match self.auth_time {
      Some(t) if t > now + leeway => return Err(Error::InvalidClaim("auth_time")),
      Some(t) => Some(DateTime::from_timestamp(t, 0).ok_or(Error::InvalidClaim("auth_time"))?),
      None => None,
    };

    Ok(Claims {
      subject: self.sub,
      email: self.email,
      display_name: self.name,
      email_verified: self.email_verified,
      auth_time,
    })
  }
}
