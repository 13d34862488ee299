//! Quota ledger: per-user daily generation accounting.

use thiserror::Error;
use tracing::{debug, info};

use crate::storage::{Database, DatabaseError};

/// Quota ledger errors.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// The user id does not reference a provisioned user. The ledger never
    /// creates users on the fly.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error(transparent)]
    Storage(DatabaseError),
}

impl From<DatabaseError> for QuotaError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(what) => Self::UnknownUser(what),
            other => Self::Storage(other),
        }
    }
}

/// Outcome of a consume attempt.
///
/// Being over the limit is an expected result, not an error; `remaining` is
/// `None` for premium users (unbounded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub remaining: Option<u32>,
}

/// Read-only quota snapshot for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub is_premium: bool,
    pub queries_used_today: u32,
    /// `None` = unbounded (premium).
    pub queries_remaining: Option<u32>,
    pub daily_limit: u32,
}

/// Gates AI-generation calls by daily usage.
#[derive(Clone)]
pub struct QuotaLedger {
    db: Database,
    daily_limit: u32,
}

impl QuotaLedger {
    pub const fn new(db: Database, daily_limit: u32) -> Self {
        Self { db, daily_limit }
    }

    pub const fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Check the user's budget and consume one generation if allowed.
    ///
    /// Date rollover and the increment-with-ceiling happen in one atomic
    /// statement, so two concurrent calls at `limit - 1` yield exactly one
    /// success. Premium users pass without touching the counter.
    pub async fn check_and_consume(&self, user_id: &str) -> Result<QuotaDecision, QuotaError> {
        let user = self.db.get_user(user_id).await?;
        if user.premium() {
            return Ok(QuotaDecision { allowed: true, remaining: None });
        }

        let today = today_utc();
        match self.db.consume_query(user_id, &today, self.daily_limit).await? {
            Some(used) => {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let remaining = self.daily_limit.saturating_sub(used.max(0) as u32);
                debug!(user_id = %user_id, used, remaining, "Quota consumed");
                Ok(QuotaDecision { allowed: true, remaining: Some(remaining) })
            }
            None => {
                debug!(user_id = %user_id, limit = self.daily_limit, "Quota exhausted");
                Ok(QuotaDecision { allowed: false, remaining: Some(0) })
            }
        }
    }

    /// Read-only snapshot; applies the lazy date rollover but consumes
    /// nothing.
    pub async fn status(&self, user_id: &str) -> Result<QuotaStatus, QuotaError> {
        let today = today_utc();
        self.db.rollover_quota(user_id, &today).await?;
        let user = self.db.get_user(user_id).await?;

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let used = user.queries_used_today.max(0) as u32;
        let queries_remaining = if user.premium() {
            None
        } else {
            Some(self.daily_limit.saturating_sub(used))
        };

        Ok(QuotaStatus {
            is_premium: user.premium(),
            queries_used_today: used,
            queries_remaining,
            daily_limit: self.daily_limit,
        })
    }

    /// Remove the daily ceiling for a user (admin operation).
    pub async fn grant_premium(&self, user_id: &str) -> Result<(), QuotaError> {
        if !self.db.set_premium(user_id, true).await? {
            return Err(QuotaError::UnknownUser(format!("User {user_id}")));
        }
        info!(user_id = %user_id, "Premium granted");
        Ok(())
    }

    /// Restore the daily ceiling for a user (admin operation). The counter
    /// is untouched.
    pub async fn revoke_premium(&self, user_id: &str) -> Result<(), QuotaError> {
        if !self.db.set_premium(user_id, false).await? {
            return Err(QuotaError::UnknownUser(format!("User {user_id}")));
        }
        info!(user_id = %user_id, "Premium revoked");
        Ok(())
    }
}

/// Current UTC calendar day, the granularity of the quota window.
fn today_utc() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
