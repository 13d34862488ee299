//! Database models for the Rollwise server.

use serde::{Deserialize, Serialize};

/// User record from the database.
///
/// Identity fields are written by the auth collaborator; this service only
/// mutates the premium flag, the quota columns, and the decision stats.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub is_premium: i64,
    pub queries_used_today: i64,
    pub quota_date: String,
    pub total_decisions: i64,
    pub implemented_decisions: i64,
    pub created_at: i64,
}

impl User {
    pub const fn premium(&self) -> bool {
        self.is_premium != 0
    }
}

/// Decision record from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Decision {
    pub id: String,
    pub owner_id: String,
    pub text: String,
    /// JSON array of 2-6 alternative strings, fixed at creation.
    pub alternatives: String,
    pub privacy_level: String,
    pub resolution_state: String,
    pub selected_index: Option<i64>,
    pub implemented: Option<i64>,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
    pub annotated_at: Option<i64>,
}

impl Decision {
    /// Decode the stored alternatives JSON array.
    pub fn alternatives_vec(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.alternatives)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution_state == ResolutionState::Resolved.as_str()
    }

    /// The annotated outcome, if any (`None` = unknown).
    pub fn implemented_flag(&self) -> Option<bool> {
        self.implemented.map(|v| v != 0)
    }
}

/// Public-feed row: a resolved public decision joined with its owner's name.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicDecision {
    pub id: String,
    pub username: String,
    pub text: String,
    pub alternatives: String,
    pub selected_index: Option<i64>,
    pub implemented: Option<i64>,
    pub created_at: i64,
}

/// Decision visibility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyLevel {
    Public,
    Followers,
    Private,
}

impl PrivacyLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Followers => "followers",
            Self::Private => "private",
        }
    }

    /// Parse from the wire/database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "followers" => Some(Self::Followers),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl std::fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Resolved,
}

impl ResolutionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
