//! Database queries for users and decisions.

use rollwise_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{Decision, PrivacyLevel, PublicDecision, ResolutionState, User};

impl Database {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a user row.
    ///
    /// Called by the auth collaborator when an account is provisioned; the
    /// quota columns start at zero with an epoch quota date so the first
    /// consume rolls them over.
    pub async fn create_user(&self, id: &str, username: &str) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query("INSERT INTO users (id, username, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(username)
            .bind(now)
            .execute(self.pool())
            .await?;

        self.get_user(id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Recompute a user's decision stats from the decisions table.
    ///
    /// `total_decisions` counts decisions with an annotated outcome;
    /// `implemented_decisions` the subset marked implemented. Recounting
    /// keeps re-annotation from double-counting.
    pub async fn recount_user_stats(&self, user_id: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            UPDATE users
               SET total_decisions = (
                       SELECT COUNT(*) FROM decisions
                        WHERE owner_id = ?1 AND implemented IS NOT NULL
                   ),
                   implemented_decisions = (
                       SELECT COUNT(*) FROM decisions
                        WHERE owner_id = ?1 AND implemented = 1
                   )
             WHERE id = ?1
            ",
        )
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    // =========================================================================
    // Decision queries
    // =========================================================================

    /// Insert a new decision in the `unresolved` state.
    ///
    /// `alternatives_json` must be a complete JSON array; nothing is written
    /// before the full alternative list exists, so creation is all-or-nothing.
    pub async fn create_decision(
        &self,
        id: &str,
        owner_id: &str,
        text: &str,
        alternatives_json: &str,
        privacy: PrivacyLevel,
    ) -> Result<Decision, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            r"
            INSERT INTO decisions (id, owner_id, text, alternatives, privacy_level, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id)
        .bind(owner_id)
        .bind(text)
        .bind(alternatives_json)
        .bind(privacy.as_str())
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_decision(id).await
    }

    /// Get a decision by ID.
    pub async fn get_decision(&self, id: &str) -> Result<Decision, DatabaseError> {
        sqlx::query_as::<_, Decision>("SELECT * FROM decisions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Decision {id}")))
    }

    /// Record the resolution, guarded on the decision still being unresolved.
    ///
    /// Returns `false` when the guard failed (another resolve already
    /// committed); the selected index is then left untouched.
    pub async fn resolve_decision(
        &self,
        id: &str,
        selected_index: i64,
    ) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            r"
            UPDATE decisions
               SET resolution_state = ?, selected_index = ?, resolved_at = ?
             WHERE id = ? AND resolution_state = ?
            ",
        )
        .bind(ResolutionState::Resolved.as_str())
        .bind(selected_index)
        .bind(now)
        .bind(id)
        .bind(ResolutionState::Unresolved.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the annotated outcome, guarded on the decision being resolved.
    ///
    /// Returns `false` when the decision is not (yet) resolved.
    pub async fn annotate_decision(
        &self,
        id: &str,
        implemented: bool,
    ) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            r"
            UPDATE decisions
               SET implemented = ?, annotated_at = ?
             WHERE id = ? AND resolution_state = ?
            ",
        )
        .bind(i64::from(implemented))
        .bind(now)
        .bind(id)
        .bind(ResolutionState::Resolved.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Change the privacy level, allowed only while unresolved.
    ///
    /// Returns `false` when the decision is already resolved.
    pub async fn set_decision_privacy(
        &self,
        id: &str,
        privacy: PrivacyLevel,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE decisions SET privacy_level = ? WHERE id = ? AND resolution_state = ?",
        )
        .bind(privacy.as_str())
        .bind(id)
        .bind(ResolutionState::Unresolved.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List a user's decisions, newest first.
    pub async fn list_decisions_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Decision>, DatabaseError> {
        let decisions = sqlx::query_as::<_, Decision>(
            "SELECT * FROM decisions WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;

        Ok(decisions)
    }

    /// List resolved public decisions with their owner's username, newest first.
    pub async fn list_public_resolved(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<PublicDecision>, DatabaseError> {
        let decisions = sqlx::query_as::<_, PublicDecision>(
            r"
            SELECT d.id, u.username, d.text, d.alternatives,
                   d.selected_index, d.implemented, d.created_at
              FROM decisions d
              JOIN users u ON u.id = d.owner_id
             WHERE d.privacy_level = ? AND d.resolution_state = ?
             ORDER BY d.created_at DESC, d.rowid DESC
             LIMIT ? OFFSET ?
            ",
        )
        .bind(PrivacyLevel::Public.as_str())
        .bind(ResolutionState::Resolved.as_str())
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool())
        .await?;

        Ok(decisions)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn db_with_user(user_id: &str) -> Database {
        let db = Database::open_in_memory().await.unwrap();
        db.create_user(user_id, &format!("user-{user_id}")).await.unwrap();
        db
    }

    #[tokio::test]
    async fn create_and_get_decision() {
        let db = db_with_user("u1").await;

        let decision = db
            .create_decision("d1", "u1", "Pizza or sushi?", r#"["pizza","sushi"]"#, PrivacyLevel::Private)
            .await
            .unwrap();

        assert_eq!(decision.id, "d1");
        assert_eq!(decision.owner_id, "u1");
        assert_eq!(decision.resolution_state, "unresolved");
        assert!(decision.selected_index.is_none());
        assert!(decision.implemented.is_none());
        assert_eq!(decision.alternatives_vec().unwrap(), vec!["pizza", "sushi"]);
    }

    #[tokio::test]
    async fn get_missing_decision_is_not_found() {
        let db = db_with_user("u1").await;
        assert!(matches!(
            db.get_decision("nope").await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn resolve_guard_fires_once() {
        let db = db_with_user("u1").await;
        db.create_decision("d1", "u1", "t", r#"["a","b","c"]"#, PrivacyLevel::Private)
            .await
            .unwrap();

        assert!(db.resolve_decision("d1", 2).await.unwrap());
        // Second resolve must not overwrite the first.
        assert!(!db.resolve_decision("d1", 0).await.unwrap());

        let decision = db.get_decision("d1").await.unwrap();
        assert_eq!(decision.selected_index, Some(2));
        assert!(decision.is_resolved());
        assert!(decision.resolved_at.is_some());
    }

    #[tokio::test]
    async fn annotate_requires_resolution() {
        let db = db_with_user("u1").await;
        db.create_decision("d1", "u1", "t", r#"["a","b"]"#, PrivacyLevel::Private)
            .await
            .unwrap();

        assert!(!db.annotate_decision("d1", true).await.unwrap());

        db.resolve_decision("d1", 0).await.unwrap();
        assert!(db.annotate_decision("d1", true).await.unwrap());

        let decision = db.get_decision("d1").await.unwrap();
        assert_eq!(decision.implemented_flag(), Some(true));
        // Annotation never disturbs the selection.
        assert_eq!(decision.selected_index, Some(0));
    }

    #[tokio::test]
    async fn privacy_locked_after_resolution() {
        let db = db_with_user("u1").await;
        db.create_decision("d1", "u1", "t", r#"["a","b"]"#, PrivacyLevel::Private)
            .await
            .unwrap();

        assert!(db.set_decision_privacy("d1", PrivacyLevel::Public).await.unwrap());
        db.resolve_decision("d1", 1).await.unwrap();
        assert!(!db.set_decision_privacy("d1", PrivacyLevel::Private).await.unwrap());

        let decision = db.get_decision("d1").await.unwrap();
        assert_eq!(decision.privacy_level, "public");
    }

    #[tokio::test]
    async fn history_is_reverse_chronological() {
        let db = db_with_user("u1").await;
        for i in 0..3 {
            db.create_decision(&format!("d{i}"), "u1", "t", r#"["a","b"]"#, PrivacyLevel::Private)
                .await
                .unwrap();
        }

        let history = db.list_decisions_by_owner("u1").await.unwrap();
        assert_eq!(history.len(), 3);
        // Same-second inserts fall back to insertion order, still newest first.
        assert_eq!(history[0].id, "d2");
        assert_eq!(history[2].id, "d0");
    }

    #[tokio::test]
    async fn public_feed_filters_and_paginates() {
        let db = db_with_user("u1").await;
        db.create_user("u2", "user-u2").await.unwrap();

        // Resolved public, unresolved public, resolved private.
        db.create_decision("d1", "u1", "t1", r#"["a","b"]"#, PrivacyLevel::Public)
            .await
            .unwrap();
        db.resolve_decision("d1", 0).await.unwrap();
        db.create_decision("d2", "u1", "t2", r#"["a","b"]"#, PrivacyLevel::Public)
            .await
            .unwrap();
        db.create_decision("d3", "u2", "t3", r#"["a","b"]"#, PrivacyLevel::Private)
            .await
            .unwrap();
        db.resolve_decision("d3", 1).await.unwrap();

        let feed = db.list_public_resolved(0, 20).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, "d1");
        assert_eq!(feed[0].username, "user-u1");

        let empty = db.list_public_resolved(1, 20).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn stats_recount_is_idempotent() {
        let db = db_with_user("u1").await;
        for (id, implemented) in [("d1", Some(true)), ("d2", Some(false)), ("d3", None)] {
            db.create_decision(id, "u1", "t", r#"["a","b"]"#, PrivacyLevel::Private)
                .await
                .unwrap();
            db.resolve_decision(id, 0).await.unwrap();
            if let Some(flag) = implemented {
                db.annotate_decision(id, flag).await.unwrap();
            }
        }

        db.recount_user_stats("u1").await.unwrap();
        db.recount_user_stats("u1").await.unwrap();

        let user = db.get_user("u1").await.unwrap();
        assert_eq!(user.total_decisions, 2);
        assert_eq!(user.implemented_decisions, 1);
    }
}
