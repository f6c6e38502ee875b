//! Core types and trait definitions for the Wuloye backend.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend, the identity provider and the HTTP surface all depend on
//! it; it depends on neither of them.

pub mod claims;
pub mod error;
pub mod profile;
pub mod service;
pub mod store;
pub mod verifier;

pub use claims::Claims;
pub use error::{Error, Result};
pub use profile::Profile;
pub use service::{PROFILES_COLLECTION, ProfileService};
pub use store::DocumentStore;
pub use verifier::{IdentityVerifier, InvalidCredential};
