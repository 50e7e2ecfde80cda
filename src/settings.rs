//! Reward system settings document.
//!
//! One document per settings domain; `Default` is the canonical payload
//! used both for lazy creation and for reset.

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use sqlx::types::Json;

/// Settings domain handled by this service.
pub const REWARD_SETTINGS_TYPE: &str = "reward";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoAssignmentSettings {
    pub enabled: bool,
    pub rank_based: bool,
    pub achievement_based: bool,
    pub milestone_based: bool,
}

impl Default for AutoAssignmentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            rank_based: true,
            achievement_based: true,
            milestone_based: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub push_enabled: bool,
    pub reward_assigned: bool,
    pub reward_expired: bool,
    pub milestone_reached: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            push_enabled: false,
            reward_assigned: true,
            reward_expired: true,
            milestone_reached: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RedemptionSettings {
    pub require_verification: bool,
    pub allow_multiple_redemptions: bool,
    pub expiry_notification_days: i32,
}

impl Default for RedemptionSettings {
    fn default() -> Self {
        Self {
            require_verification: true,
            allow_multiple_redemptions: false,
            expiry_notification_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RankingSettings {
    pub reset_frequency: String,
    pub points_per_transaction: i64,
    pub bonus_multiplier: f64,
    pub decay_rate: f64,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            reset_frequency: "weekly".to_string(),
            points_per_transaction: 10,
            bonus_multiplier: 1.5,
            decay_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitSettings {
    pub max_rewards_per_user: i32,
    pub max_redemptions_per_day: i32,
    pub cooldown_period_hours: i32,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_rewards_per_user: 10,
            max_redemptions_per_day: 5,
            cooldown_period_hours: 24,
        }
    }
}

/// The full settings payload, replaced wholesale on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardSettings {
    pub auto_assignment: AutoAssignmentSettings,
    pub notifications: NotificationSettings,
    pub redemption: RedemptionSettings,
    pub ranking: RankingSettings,
    pub limits: LimitSettings,
}

/// Stored settings row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub settings_type: String,
    pub payload: Json<RewardSettings>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_defaults_match_the_documented_payload() {
        let defaults = RewardSettings::default();
        assert!(defaults.auto_assignment.enabled);
        assert!(defaults.auto_assignment.rank_based);
        assert!(defaults.notifications.email_enabled);
        assert!(!defaults.notifications.push_enabled);
        assert!(defaults.redemption.require_verification);
        assert!(!defaults.redemption.allow_multiple_redemptions);
        assert_eq!(defaults.redemption.expiry_notification_days, 7);
        assert_eq!(defaults.ranking.reset_frequency, "weekly");
        assert_eq!(defaults.ranking.points_per_transaction, 10);
        assert_eq!(defaults.ranking.bonus_multiplier, 1.5);
        assert_eq!(defaults.ranking.decay_rate, 0.1);
        assert_eq!(defaults.limits.max_rewards_per_user, 10);
        assert_eq!(defaults.limits.max_redemptions_per_day, 5);
        assert_eq!(defaults.limits.cooldown_period_hours, 24);
    }

    #[test]
    fn payload_round_trips_through_json() {
        let mut settings = RewardSettings::default();
        settings.ranking.reset_frequency = "monthly".to_string();
        settings.limits.max_rewards_per_user = 3;

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["ranking"]["resetFrequency"], "monthly");
        assert_eq!(json["limits"]["maxRewardsPerUser"], 3);

        let back: RewardSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let partial = serde_json::json!({
            "notifications": {"pushEnabled": true}
        });
        let settings: RewardSettings = serde_json::from_value(partial).unwrap();
        assert!(settings.notifications.push_enabled);
        assert!(settings.notifications.email_enabled);
        assert_eq!(settings.ranking, RankingSettings::default());
    }
}
