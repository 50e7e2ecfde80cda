//! Reward catalog domain models and request/response DTOs

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

/// Reward template categories
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "reward_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    Discount,
    Bonus,
    Points,
    Badge,
    Custom,
}

/// Reward value, keyed by its unit.
///
/// Serializes as `{"unit": "percentage", "value": 10.0}` so the unit can
/// never disagree with the representation of the value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum RewardValue {
    Percentage(f64),
    Amount(f64),
    Points(i64),
    Text(String),
}

impl RewardValue {
    /// Numeric magnitude for aggregation; text rewards contribute zero.
    pub fn numeric(&self) -> f64 {
        match self {
            RewardValue::Percentage(v) | RewardValue::Amount(v) => *v,
            RewardValue::Points(v) => *v as f64,
            RewardValue::Text(_) => 0.0,
        }
    }
}

/// Eligibility thresholds read by the external ranking trigger. Stored and
/// served verbatim; this engine does not evaluate them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardConditions {
    pub min_transactions: i64,
    pub min_points: i64,
    pub min_amount: f64,
}

/// Reward template model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RewardTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub reward_type: RewardType,
    #[serde(flatten)]
    pub value: Json<RewardValue>,
    pub rank: i32,
    pub is_active: bool,
    pub auto_assign: bool,
    pub max_redemptions: Option<i32>,
    pub current_redemptions: i32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub conditions: Json<RewardConditions>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a reward template
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRewardRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub description: Option<String>,
    pub reward_type: RewardType,
    #[serde(flatten)]
    pub value: RewardValue,
    #[validate(range(min = 1))]
    pub rank: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub auto_assign: bool,
    #[validate(range(min = 1))]
    pub max_redemptions: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conditions: RewardConditions,
}

fn default_true() -> bool {
    true
}

/// Payload for partially updating a reward template. Absent fields are left
/// untouched.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRewardRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub reward_type: Option<RewardType>,
    pub value: Option<RewardValue>,
    #[validate(range(min = 1))]
    pub rank: Option<i32>,
    pub is_active: Option<bool>,
    pub auto_assign: Option<bool>,
    #[validate(range(min = 1))]
    pub max_redemptions: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub conditions: Option<RewardConditions>,
}

/// Query parameters for listing reward templates
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRewardsQuery {
    pub reward_type: Option<RewardType>,
    pub is_active: Option<bool>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

/// Payload for toggling activation on a batch of templates
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
    pub is_active: bool,
}

/// Result of a bulk activation toggle; ids that did not match any template
/// are silently skipped.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusResponse {
    pub modified: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_value_is_tagged_by_unit() {
        let value = RewardValue::Percentage(12.5);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"unit": "percentage", "value": 12.5})
        );

        let back: RewardValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);

        let text: RewardValue =
            serde_json::from_value(serde_json::json!({"unit": "text", "value": "VIP lounge"}))
                .unwrap();
        assert_eq!(text, RewardValue::Text("VIP lounge".to_string()));
    }

    #[test]
    fn numeric_magnitude_ignores_text() {
        assert_eq!(RewardValue::Amount(500.0).numeric(), 500.0);
        assert_eq!(RewardValue::Points(30).numeric(), 30.0);
        assert_eq!(RewardValue::Text("badge".into()).numeric(), 0.0);
    }

    #[test]
    fn create_request_parses_flattened_value() {
        let body = serde_json::json!({
            "name": "Champion",
            "rewardType": "bonus",
            "unit": "amount",
            "value": 500.0,
            "rank": 1
        });
        let req: CreateRewardRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.value, RewardValue::Amount(500.0));
        assert!(req.is_active);
        assert!(!req.auto_assign);
        assert_eq!(req.conditions, RewardConditions::default());
    }

    #[test]
    fn create_request_validation_rejects_bad_fields() {
        let req = CreateRewardRequest {
            name: "".into(),
            description: None,
            reward_type: RewardType::Bonus,
            value: RewardValue::Amount(500.0),
            rank: 0,
            is_active: true,
            auto_assign: false,
            max_redemptions: Some(0),
            valid_from: None,
            valid_until: None,
            conditions: RewardConditions::default(),
        };
        let errors = validator::Validate::validate(&req).unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("rank"));
        assert!(fields.contains_key("max_redemptions"));
    }
}
