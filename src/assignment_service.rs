//! Assignment/redemption service - the reward lifecycle state machine
//!
//! Owns the ledger mutations: assignment with the one-live-row-per
//! (user, reward) invariant, redemption with lazy expiry, cancellation, and
//! the template redemption counter. Every transition is a single guarded
//! SQL statement so concurrent calls cannot leave a row half-moved; the
//! partial unique indexes in the schema are the source of truth for both
//! uniqueness invariants.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use rand::Rng;
use serde_json::json;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::audit::{AuditLevel, AuditLogger};
use crate::error::{is_unique_violation, ApiError};
use crate::ledger::{
    AssignRewardRequest, ListUserRewardsQuery, RewardSnapshot, UserReward,
};
use crate::models::{Paginated, PaginationParams, UserAccount};
use crate::reward::RewardTemplate;
use crate::users::UserDirectory;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 8;
/// Collisions on an 8-character code are rare; a handful of retries is
/// plenty before we call the store broken.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Names of the unique indexes backing the ledger invariants.
const CODE_UQ: &str = "user_rewards_code_uq";
const LIVE_UQ: &str = "user_rewards_live_uq";

const AUDIT_CATEGORY: &str = "reward";

pub struct AssignmentService {
    db_pool: PgPool,
    users: Arc<dyn UserDirectory>,
    audit: Arc<dyn AuditLogger>,
}

impl AssignmentService {
    pub fn new(
        db_pool: PgPool,
        users: Arc<dyn UserDirectory>,
        audit: Arc<dyn AuditLogger>,
    ) -> Self {
        Self {
            db_pool,
            users,
            audit,
        }
    }

    /// Assign a reward to a user, creating the ledger row.
    pub async fn assign(
        &self,
        request: AssignRewardRequest,
        actor: Uuid,
    ) -> Result<UserReward, ApiError> {
        match self.try_assign(&request).await {
            Ok((row, user)) => {
                self.audit
                    .log(
                        AuditLevel::Info,
                        AUDIT_CATEGORY,
                        &format!(
                            "Reward '{}' assigned to {}",
                            row.reward_snapshot.name, user.username
                        ),
                        Some(actor),
                        None,
                        json!({
                            "rewardId": row.reward_id,
                            "userId": row.user_id,
                            "username": user.username,
                            "redemptionCode": row.redemption_code,
                            "assignedAt": row.assigned_at,
                        }),
                        json!({"operation": "assign_reward"}),
                    )
                    .await;
                Ok(row)
            }
            Err(err) => {
                self.audit
                    .log(
                        AuditLevel::Error,
                        AUDIT_CATEGORY,
                        "Reward assignment failed",
                        Some(actor),
                        None,
                        json!({
                            "userId": request.user_id,
                            "rewardId": request.reward_id,
                            "error": format!("{err:?}"),
                        }),
                        json!({"operation": "assign_reward"}),
                    )
                    .await;
                Err(err)
            }
        }
    }

    async fn try_assign(
        &self,
        request: &AssignRewardRequest,
    ) -> Result<(UserReward, UserAccount), ApiError> {
        // Format-check both ids before touching the store.
        let user_id = Uuid::parse_str(&request.user_id).map_err(|_| {
            ApiError::InvalidArgument("Invalid user id".to_string())
        })?;
        let reward_id = Uuid::parse_str(&request.reward_id).map_err(|_| {
            ApiError::InvalidArgument("Invalid reward id".to_string())
        })?;

        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let reward = sqlx::query_as::<_, RewardTemplate>(
            "SELECT * FROM rewards WHERE id = $1",
        )
        .bind(reward_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reward not found".to_string()))?;

        // Pre-check only; the partial unique index catches the
        // check-then-insert race below.
        let already_held: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM user_rewards
                WHERE user_id = $1 AND reward_id = $2
                  AND status IN ('assigned', 'redeemed')
            )
            "#,
        )
        .bind(user_id)
        .bind(reward_id)
        .fetch_one(&self.db_pool)
        .await?;

        if already_held {
            return Err(ApiError::Conflict(
                "User already holds this reward".to_string(),
            ));
        }

        let snapshot = RewardSnapshot {
            name: reward.name.clone(),
            reward_type: reward.reward_type,
            value: reward.value.0.clone(),
        };

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_redemption_code();
            let inserted = sqlx::query_as::<_, UserReward>(
                r#"
                INSERT INTO user_rewards (
                    user_id, reward_id, status, redemption_code,
                    reward_snapshot, notes, assigned_at, expires_at
                )
                VALUES ($1, $2, 'assigned', $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(reward_id)
            .bind(&code)
            .bind(Json(&snapshot))
            .bind(request.notes.as_deref())
            .bind(Utc::now())
            .bind(reward.valid_until)
            .fetch_one(&self.db_pool)
            .await;

            match inserted {
                Ok(row) => return Ok((row, user)),
                // Another row already carries this code; roll a new one.
                Err(err) if is_unique_violation(&err, CODE_UQ) => continue,
                // Lost the race with a concurrent assign for the same pair.
                Err(err) if is_unique_violation(&err, LIVE_UQ) => {
                    return Err(ApiError::Conflict(
                        "User already holds this reward".to_string(),
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ApiError::Internal(anyhow!(
            "redemption code generation exhausted {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    /// Redeem an assignment.
    ///
    /// With a redemption code this is the assisted path and the caller need
    /// not own the row; without one, the row must belong to the caller.
    /// Expiry is detected here and persisted even though the call fails.
    pub async fn redeem(
        &self,
        assignment_id: Uuid,
        redemption_code: Option<&str>,
        caller: Uuid,
    ) -> Result<UserReward, ApiError> {
        match self
            .try_redeem(assignment_id, redemption_code, caller)
            .await
        {
            Ok(row) => {
                self.audit
                    .log(
                        AuditLevel::Info,
                        AUDIT_CATEGORY,
                        &format!("Reward '{}' redeemed", row.reward_snapshot.name),
                        Some(caller),
                        None,
                        json!({
                            "assignmentId": row.id,
                            "rewardId": row.reward_id,
                            "userId": row.user_id,
                            "redemptionCode": row.redemption_code,
                            "redeemedAt": row.redeemed_at,
                        }),
                        json!({"operation": "redeem_reward"}),
                    )
                    .await;
                Ok(row)
            }
            Err(err) => {
                self.audit
                    .log(
                        AuditLevel::Error,
                        AUDIT_CATEGORY,
                        "Reward redemption failed",
                        Some(caller),
                        None,
                        json!({
                            "assignmentId": assignment_id,
                            "error": format!("{err:?}"),
                        }),
                        json!({"operation": "redeem_reward"}),
                    )
                    .await;
                Err(err)
            }
        }
    }

    async fn try_redeem(
        &self,
        assignment_id: Uuid,
        redemption_code: Option<&str>,
        caller: Uuid,
    ) -> Result<UserReward, ApiError> {
        let row = match redemption_code {
            Some(code) => {
                sqlx::query_as::<_, UserReward>(
                    r#"
                    SELECT * FROM user_rewards
                    WHERE id = $1 AND redemption_code = $2 AND status = 'assigned'
                    "#,
                )
                .bind(assignment_id)
                .bind(code)
                .fetch_optional(&self.db_pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, UserReward>(
                    "SELECT * FROM user_rewards WHERE id = $1 AND status = 'assigned'",
                )
                .bind(assignment_id)
                .fetch_optional(&self.db_pool)
                .await?
            }
        }
        .ok_or_else(|| {
            ApiError::NotFound(
                "Reward assignment not found or already redeemed".to_string(),
            )
        })?;

        if redemption_code.is_none() && row.user_id != caller {
            return Err(ApiError::Forbidden(
                "Reward assignment belongs to another user".to_string(),
            ));
        }

        if let Some(expires_at) = row.expires_at {
            if expires_at < Utc::now() {
                // Lazy expiry: persist the terminal state so later reads see
                // it, then fail the redemption.
                sqlx::query(
                    r#"
                    UPDATE user_rewards SET status = 'expired'
                    WHERE id = $1 AND status = 'assigned'
                    "#,
                )
                .bind(row.id)
                .execute(&self.db_pool)
                .await?;

                return Err(ApiError::InvalidState(
                    "Reward has expired".to_string(),
                ));
            }
        }

        // The status transition and the template counter commit together;
        // the ledger can never show a redeemed row the counter missed.
        let mut tx = self.db_pool.begin().await?;

        // Guarded transition: a concurrent redeem of the same row sees zero
        // matching rows here and reports NotFound.
        let redeemed = sqlx::query_as::<_, UserReward>(
            r#"
            UPDATE user_rewards
            SET status = 'redeemed', redeemed_at = $2
            WHERE id = $1 AND status = 'assigned'
            RETURNING *
            "#,
        )
        .bind(row.id)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(
                "Reward assignment not found or already redeemed".to_string(),
            )
        })?;

        // Increment in place; two users redeeming the same template
        // concurrently must both be counted.
        sqlx::query(
            r#"
            UPDATE rewards
            SET current_redemptions = current_redemptions + 1, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(redeemed.reward_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(redeemed)
    }

    /// Cancel an assignment (external administrative override). Only an
    /// `assigned` row can be cancelled; this core assumes nothing about why.
    pub async fn cancel(
        &self,
        assignment_id: Uuid,
        actor: Uuid,
    ) -> Result<UserReward, ApiError> {
        let cancelled = sqlx::query_as::<_, UserReward>(
            r#"
            UPDATE user_rewards
            SET status = 'cancelled'
            WHERE id = $1 AND status = 'assigned'
            RETURNING *
            "#,
        )
        .bind(assignment_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(
                "Reward assignment not found or not cancellable".to_string(),
            )
        })?;

        self.audit
            .log(
                AuditLevel::Info,
                AUDIT_CATEGORY,
                &format!(
                    "Reward '{}' assignment cancelled",
                    cancelled.reward_snapshot.name
                ),
                Some(actor),
                None,
                json!({
                    "assignmentId": cancelled.id,
                    "rewardId": cancelled.reward_id,
                    "userId": cancelled.user_id,
                }),
                json!({"operation": "cancel_assignment"}),
            )
            .await;

        Ok(cancelled)
    }

    /// List a user's assignments, newest first. Without an explicit user id
    /// this is the self-service listing for the caller.
    pub async fn get_user_rewards(
        &self,
        user_id: Option<&str>,
        caller: Uuid,
        query: ListUserRewardsQuery,
    ) -> Result<Paginated<UserReward>, ApiError> {
        let user_id = match user_id {
            Some(raw) => Uuid::parse_str(raw).map_err(|_| {
                ApiError::InvalidArgument("Invalid user id".to_string())
            })?,
            None => caller,
        };

        let (page, limit) = PaginationParams {
            page: query.page,
            limit: query.limit,
        }
        .normalize();
        let offset = (page - 1) * limit;

        let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM user_rewards WHERE user_id = ",
        );
        count_builder.push_bind(user_id);
        if let Some(status) = query.status {
            count_builder.push(" AND status = ");
            count_builder.push_bind(status);
        }
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM user_rewards WHERE user_id = ");
        query_builder.push_bind(user_id);
        if let Some(status) = query.status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
        }
        query_builder.push(" ORDER BY assigned_at DESC LIMIT ");
        query_builder.push_bind(limit as i64);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset as i64);

        let rows = query_builder
            .build_query_as::<UserReward>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(Paginated {
            data: rows,
            total,
            page,
            limit,
        })
    }
}

/// 8 characters drawn independently from the 36-symbol uppercase
/// alphanumeric alphabet. Uniqueness is the database's job.
fn generate_redemption_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redemption_codes_are_eight_uppercase_alphanumerics() {
        for _ in 0..100 {
            let code = generate_redemption_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn redemption_codes_vary() {
        let codes: std::collections::HashSet<String> =
            (0..50).map(|_| generate_redemption_code()).collect();
        // 36^8 possibilities; 50 draws colliding down to a handful would
        // mean the generator is broken.
        assert!(codes.len() > 40);
    }
}
