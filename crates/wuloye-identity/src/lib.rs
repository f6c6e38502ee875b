//! Firebase Authentication ID-token verification.
//!
//! [`FirebaseVerifier`] implements [`wuloye_core::IdentityVerifier`] by
//! checking RS256 signatures against Google's published public keys and
//! validating the Firebase-specific claims (audience, issuer, timestamps).
//!
//! ```rust,ignore
//! let verifier = FirebaseVerifier::new("my-project")?;
//! let claims = verifier.verify(token).await?;
//! ```

mod keys;
mod token;
mod verifier;

pub mod error;

pub use error::{Error, Result};
pub use keys::{Jwk, JwkSet};
pub use token::FirebaseTokenClaims;
pub use verifier::{FIREBASE_JWKS_URL, FirebaseVerifier};
