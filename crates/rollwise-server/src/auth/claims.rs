//! JWT claims structure shared with the auth collaborator.

use serde::{Deserialize, Serialize};

/// Claims embedded in access tokens issued by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Username, carried for log context only.
    pub username: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}
