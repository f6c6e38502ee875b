//! Route handlers.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `GET`  | `/api/health`  | none |
//! | `GET`  | `/api/profile` | `Authorization: Bearer <token>` |

pub mod health;
pub mod profile;
