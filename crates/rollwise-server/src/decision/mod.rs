//! Decision lifecycle: creation, randomized resolution, outcome annotation.
//!
//! State machine per decision:
//!
//! ```text
//! [none] --create--> unresolved --resolve--> resolved --annotate--> resolved(annotated)
//! ```

mod lifecycle;
mod resolution;

pub use lifecycle::{CreatedDecision, DecisionService};
pub use resolution::{Resolution, ResolutionEngine};

use thiserror::Error;

use crate::quota::QuotaError;
use crate::storage::DatabaseError;

/// Decision operation errors, mapped 1:1 onto the external surface.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// Caller-fixable input problem (empty text, bad privacy level).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Daily generation budget exhausted; expected and non-fatal.
    #[error("Daily generation quota exhausted")]
    QuotaExceeded { remaining: u32 },

    /// Requester is not the owner. Carries no resource detail.
    #[error("Access to this decision is denied")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Resolution may happen exactly once; a second attempt is a caller bug.
    #[error("Decision is already resolved")]
    AlreadyResolved,

    /// Outcome annotation requires a resolved decision.
    #[error("Decision is not resolved yet")]
    NotYetResolved,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(DatabaseError),
}

impl From<DatabaseError> for DecisionError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(what) => Self::NotFound(what),
            other => Self::Storage(other),
        }
    }
}

impl From<QuotaError> for DecisionError {
    fn from(e: QuotaError) -> Self {
        match e {
            QuotaError::UnknownUser(what) => Self::NotFound(what),
            QuotaError::Storage(err) => Self::Storage(err),
        }
    }
}
