//! Decision lifecycle controller.
//!
//! Orchestrates quota ledger, generator adapter, resolution engine, and the
//! record store. Holds no long-lived decision state: every operation fetches
//! fresh, so correctness does not depend on single-process memory.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::generator::GeneratorAdapter;
use crate::quota::QuotaLedger;
use crate::storage::{Database, Decision, PrivacyLevel, PublicDecision};

use super::resolution::{Resolution, ResolutionEngine};
use super::DecisionError;

/// Public feed page-size ceiling.
const MAX_PUBLIC_PAGE: u32 = 50;

/// Result of a successful create.
#[derive(Debug, Clone)]
pub struct CreatedDecision {
    pub decision_id: String,
    pub alternatives: Vec<String>,
}

/// Orchestrates the decision state machine.
#[derive(Clone)]
pub struct DecisionService {
    db: Database,
    ledger: QuotaLedger,
    generator: GeneratorAdapter,
    resolution: ResolutionEngine,
}

impl DecisionService {
    pub fn new(db: Database, ledger: QuotaLedger, generator: GeneratorAdapter) -> Self {
        let resolution = ResolutionEngine::new(db.clone());
        Self { db, ledger, generator, resolution }
    }

    /// Create a decision: consume quota, generate alternatives, persist.
    ///
    /// The ledger is consulted before the generator, so an over-quota user
    /// costs no provider call. Nothing is persisted until the full
    /// alternative list is in hand.
    #[instrument(skip(self, text))]
    pub async fn create(
        &self,
        owner_id: &str,
        text: &str,
        privacy: PrivacyLevel,
    ) -> Result<CreatedDecision, DecisionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DecisionError::InvalidInput(
                "decision text must not be empty".to_string(),
            ));
        }

        let quota = self.ledger.check_and_consume(owner_id).await?;
        if !quota.allowed {
            return Err(DecisionError::QuotaExceeded { remaining: 0 });
        }

        let alternatives = self
            .generator
            .generate(text)
            .await
            .map_err(|e| DecisionError::InvalidInput(e.to_string()))?;
        let alternatives_json = serde_json::to_string(&alternatives)?;

        let id = Uuid::new_v4().to_string();
        self.db
            .create_decision(&id, owner_id, text, &alternatives_json, privacy)
            .await?;

        info!(
            decision_id = %id,
            owner_id = %owner_id,
            alternatives = alternatives.len(),
            "Decision created"
        );

        Ok(CreatedDecision { decision_id: id, alternatives })
    }

    /// Roll the dice for an unresolved decision owned by the requester.
    pub async fn resolve(
        &self,
        decision_id: &str,
        requester_id: &str,
    ) -> Result<Resolution, DecisionError> {
        self.resolution.resolve(decision_id, requester_id).await
    }

    /// Record whether the owner acted on a resolved decision.
    ///
    /// Re-annotation is allowed while resolved; the owner's decision stats
    /// are recounted afterwards.
    #[instrument(skip(self))]
    pub async fn annotate_outcome(
        &self,
        decision_id: &str,
        requester_id: &str,
        implemented: bool,
    ) -> Result<(), DecisionError> {
        let decision = self.db.get_decision(decision_id).await?;
        if decision.owner_id != requester_id {
            return Err(DecisionError::Forbidden);
        }

        let updated = self.db.annotate_decision(decision_id, implemented).await?;
        if !updated {
            return Err(DecisionError::NotYetResolved);
        }

        self.db.recount_user_stats(requester_id).await?;

        info!(decision_id = %decision_id, implemented, "Outcome recorded");
        Ok(())
    }

    /// Change the privacy level of an unresolved decision.
    pub async fn set_privacy(
        &self,
        decision_id: &str,
        requester_id: &str,
        privacy: PrivacyLevel,
    ) -> Result<(), DecisionError> {
        let decision = self.db.get_decision(decision_id).await?;
        if decision.owner_id != requester_id {
            return Err(DecisionError::Forbidden);
        }

        let updated = self.db.set_decision_privacy(decision_id, privacy).await?;
        if !updated {
            return Err(DecisionError::AlreadyResolved);
        }

        Ok(())
    }

    /// The requester's own decisions, any privacy level, newest first.
    pub async fn list_history(&self, requester_id: &str) -> Result<Vec<Decision>, DecisionError> {
        Ok(self.db.list_decisions_by_owner(requester_id).await?)
    }

    /// Resolved public decisions, newest first.
    pub async fn list_public(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<PublicDecision>, DecisionError> {
        let limit = limit.clamp(1, MAX_PUBLIC_PAGE);
        Ok(self.db.list_public_resolved(skip, limit).await?)
    }
}
