//! User reward ledger models: one row per (user, reward) assignment.

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::reward::{RewardType, RewardValue};

/// Assignment lifecycle.
///
/// `assigned` is the only non-terminal state. `expired` is written lazily at
/// redemption time; `cancelled` is driven by an external administrative
/// action only.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "reward_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RewardStatus {
    Assigned,
    Redeemed,
    Expired,
    Cancelled,
}

/// Frozen copy of the template at assignment time. Later edits or deletion
/// of the template cannot change historical ledger rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RewardSnapshot {
    pub name: String,
    pub reward_type: RewardType,
    #[serde(flatten)]
    pub value: RewardValue,
}

/// Ledger row model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserReward {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reward_id: Uuid,
    pub status: RewardStatus,
    pub redemption_code: String,
    pub reward_snapshot: Json<RewardSnapshot>,
    pub notes: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Payload for assigning a reward to a user.
///
/// Ids arrive as strings and are format-checked before any lookup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRewardRequest {
    pub user_id: String,
    pub reward_id: String,
    pub notes: Option<String>,
}

/// Payload for redeeming an assignment. With a code this is the assisted
/// path (no ownership requirement); without, the self-service path.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRewardRequest {
    pub redemption_code: Option<String>,
}

/// Query parameters for listing a user's assignments
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUserRewardsQuery {
    pub status: Option<RewardStatus>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_with_flattened_value() {
        let snapshot = RewardSnapshot {
            name: "Champion".into(),
            reward_type: RewardType::Bonus,
            value: RewardValue::Amount(500.0),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Champion",
                "rewardType": "bonus",
                "unit": "amount",
                "value": 500.0
            })
        );

        let back: RewardSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn status_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_string(&RewardStatus::Assigned).unwrap(),
            "\"assigned\""
        );
        let status: RewardStatus = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(status, RewardStatus::Expired);
    }
}
