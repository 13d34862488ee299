//! Auth collaborator boundary.
//!
//! Token issuance, registration, and credential storage live in the external
//! auth service. This module only validates bearer tokens and exposes the
//! authenticated identity; the rest of the server trusts `Claims::sub` as
//! the current user id without re-checking credentials.

mod claims;
mod jwt;

pub use claims::Claims;
pub use jwt::JwtManager;
