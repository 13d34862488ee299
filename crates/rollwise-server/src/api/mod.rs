//! HTTP/JSON API surface.
//!
//! Thin handlers over [`crate::decision::DecisionService`] and
//! [`crate::quota::QuotaLedger`]; domain errors map 1:1 onto response kinds.

mod error;
mod extract;
mod routes;

pub use error::ApiError;
pub use extract::AuthUser;
pub use routes::{router, AppState};
