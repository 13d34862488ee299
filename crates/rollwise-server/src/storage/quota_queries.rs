//! Quota accounting queries.
//!
//! The daily counter lives on the user row. Rollover and the
//! increment-with-ceiling are fused into single conditional UPDATE
//! statements so concurrent consumers on the same user cannot jointly
//! exceed the limit.

use super::db::{Database, DatabaseError};

impl Database {
    /// Reset the daily counter if the stored quota date is not `today`.
    ///
    /// Idempotent; reads that only report quota state call this first so a
    /// stale counter is never observed.
    pub async fn rollover_quota(&self, user_id: &str, today: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE users SET queries_used_today = 0, quota_date = ? WHERE id = ? AND quota_date <> ?",
        )
        .bind(today)
        .bind(user_id)
        .bind(today)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Atomically consume one generation from the user's daily budget.
    ///
    /// A stale `quota_date` counts as a fresh day (counter restarts at 1).
    /// Returns the post-increment counter, or `None` when the user is at the
    /// limit (or does not exist -- callers check existence separately).
    pub async fn consume_query(
        &self,
        user_id: &str,
        today: &str,
        daily_limit: u32,
    ) -> Result<Option<i64>, DatabaseError> {
        let used: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE users
               SET queries_used_today = CASE WHEN quota_date = ?2
                                             THEN queries_used_today + 1
                                             ELSE 1
                                        END,
                   quota_date = ?2
             WHERE id = ?1
               AND (CASE WHEN quota_date = ?2 THEN queries_used_today ELSE 0 END) < ?3
            RETURNING queries_used_today
            ",
        )
        .bind(user_id)
        .bind(today)
        .bind(daily_limit)
        .fetch_optional(self.pool())
        .await?;

        Ok(used)
    }

    /// Flip the premium flag. Returns `false` for an unknown user.
    ///
    /// The daily counter is deliberately untouched: revoking premium puts
    /// the user back on whatever budget they had consumed today.
    pub async fn set_premium(&self, user_id: &str, premium: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET is_premium = ? WHERE id = ?")
            .bind(i64::from(premium))
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Force quota state for a user (test seeding).
    #[doc(hidden)]
    pub async fn seed_quota_state(
        &self,
        user_id: &str,
        queries_used_today: i64,
        quota_date: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET queries_used_today = ?, quota_date = ? WHERE id = ?")
            .bind(queries_used_today)
            .bind(quota_date)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
