//! Resolution engine: pick one alternative, uniformly, exactly once.

use rand::Rng;
use tracing::{info, instrument};

use crate::generator::{MAX_ALTERNATIVES, MIN_ALTERNATIVES};
use crate::storage::{Database, DatabaseError};

use super::DecisionError;

/// Outcome of a successful roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub selected_index: usize,
    pub selected_text: String,
}

/// Converts a decision's alternative count into a randomized index and
/// persists it through the storage compare-and-set.
#[derive(Clone)]
pub struct ResolutionEngine {
    db: Database,
}

impl ResolutionEngine {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Roll the dice for a decision.
    ///
    /// Preconditions: the decision exists, belongs to `requester_id`, and is
    /// unresolved. The storage update is guarded on `resolution_state`, so a
    /// concurrent second roll observes the committed state and fails with
    /// `AlreadyResolved` instead of re-rolling.
    #[instrument(skip(self))]
    #[allow(clippy::cast_possible_wrap)]
    pub async fn resolve(
        &self,
        decision_id: &str,
        requester_id: &str,
    ) -> Result<Resolution, DecisionError> {
        let decision = self.db.get_decision(decision_id).await?;
        if decision.owner_id != requester_id {
            return Err(DecisionError::Forbidden);
        }
        if decision.is_resolved() {
            return Err(DecisionError::AlreadyResolved);
        }

        let mut alternatives = decision.alternatives_vec()?;
        // 2..=6 by construction; anything else is a corrupt row.
        if !(MIN_ALTERNATIVES..=MAX_ALTERNATIVES).contains(&alternatives.len()) {
            return Err(DecisionError::Storage(DatabaseError::Query(format!(
                "Decision {decision_id} has {} alternatives",
                alternatives.len()
            ))));
        }

        // Uniform over [0, len): every alternative gets 1/len probability.
        let selected_index = rand::rng().random_range(0..alternatives.len());

        let updated = self.db.resolve_decision(decision_id, selected_index as i64).await?;
        if !updated {
            // Lost the race against a concurrent resolve.
            return Err(DecisionError::AlreadyResolved);
        }

        info!(decision_id = %decision_id, selected_index, "Decision resolved");

        let selected_text = alternatives.swap_remove(selected_index);
        Ok(Resolution { selected_index, selected_text })
    }
}
