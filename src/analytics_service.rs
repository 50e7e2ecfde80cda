//! Analytics service - read-only aggregation over catalog and ledger

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::reward::RewardType;

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub total_rewards: i64,
    pub active_rewards: i64,
    pub redeemed: i64,
    pub outstanding: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TypeBreakdownEntry {
    pub reward_type: RewardType,
    pub count: i64,
    pub total_value: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRedemptions {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardAnalytics {
    pub overview: AnalyticsOverview,
    pub by_type: Vec<TypeBreakdownEntry>,
    pub monthly_redemptions: Vec<MonthlyRedemptions>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopReward {
    pub reward_id: Uuid,
    pub name: String,
    pub assignments: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub total_users: i64,
    pub total_rewards: i64,
    pub active_rewards: i64,
    pub total_assignments: i64,
    pub redeemed_count: i64,
    pub redemption_rate: f64,
    pub top_rewards: Vec<TopReward>,
}

pub struct AnalyticsService {
    db_pool: PgPool,
}

impl AnalyticsService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Overview counts plus per-type and per-month breakdowns.
    pub async fn reward_analytics(&self) -> Result<RewardAnalytics, ApiError> {
        let overview = self.overview().await?;

        let by_type = sqlx::query_as::<_, TypeBreakdownEntry>(
            r#"
            SELECT
                reward_type,
                COUNT(*) AS count,
                COALESCE(SUM(
                    CASE WHEN value->>'unit' <> 'text'
                         THEN (value->>'value')::float8
                         ELSE 0
                    END
                ), 0)::float8 AS total_value
            FROM rewards
            GROUP BY reward_type
            ORDER BY reward_type
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        let monthly_redemptions = sqlx::query_as::<_, MonthlyRedemptions>(
            r#"
            SELECT to_char(redeemed_at, 'YYYY-MM') AS month, COUNT(*) AS count
            FROM user_rewards
            WHERE status = 'redeemed' AND redeemed_at IS NOT NULL
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(RewardAnalytics {
            overview,
            by_type,
            monthly_redemptions,
        })
    }

    async fn overview(&self) -> Result<AnalyticsOverview, ApiError> {
        let overview = sqlx::query_as::<_, AnalyticsOverview>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM rewards) AS total_rewards,
                (SELECT COUNT(*) FROM rewards WHERE is_active) AS active_rewards,
                (SELECT COUNT(*) FROM user_rewards WHERE status = 'redeemed') AS redeemed,
                (SELECT COUNT(*) FROM user_rewards WHERE status = 'assigned') AS outstanding
            "#,
        )
        .fetch_one(&self.db_pool)
        .await?;

        Ok(overview)
    }

    /// Platform-wide stats for the admin dashboard. Top rewards are named
    /// from the ledger snapshot so deleted templates still report.
    pub async fn system_stats(&self) -> Result<SystemStats, ApiError> {
        let (total_users, total_rewards, active_rewards, total_assignments, redeemed_count) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM rewards),
                    (SELECT COUNT(*) FROM rewards WHERE is_active),
                    (SELECT COUNT(*) FROM user_rewards),
                    (SELECT COUNT(*) FROM user_rewards WHERE status = 'redeemed')
                "#,
            )
            .fetch_one(&self.db_pool)
            .await?;

        let top_rewards = sqlx::query_as::<_, TopReward>(
            r#"
            SELECT
                reward_id,
                MAX(reward_snapshot->>'name') AS name,
                COUNT(*) AS assignments
            FROM user_rewards
            GROUP BY reward_id
            ORDER BY COUNT(*) DESC, reward_id
            LIMIT 5
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(SystemStats {
            total_users,
            total_rewards,
            active_rewards,
            total_assignments,
            redeemed_count,
            redemption_rate: redemption_rate(redeemed_count, total_assignments),
            top_rewards,
        })
    }
}

/// Redeemed share as a percentage rounded to two decimals; 0 when there are
/// no assignments at all.
fn redemption_rate(redeemed: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (redeemed as f64 / total as f64 * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redemption_rate_rounds_to_two_decimals() {
        assert_eq!(redemption_rate(0, 0), 0.0);
        assert_eq!(redemption_rate(0, 10), 0.0);
        assert_eq!(redemption_rate(1, 3), 33.33);
        assert_eq!(redemption_rate(2, 3), 66.67);
        assert_eq!(redemption_rate(5, 5), 100.0);
    }
}
