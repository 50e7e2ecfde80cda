//! Route definitions for the RankPay rewards API

use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::app_state::AppState;
use crate::handlers::*;

// Reward catalog routes
pub fn reward_routes() -> Router<AppState> {
    Router::new()
        .route("/api/rewards", get(list_rewards))
        .route("/api/rewards", post(create_reward))
        .route("/api/rewards/bulk-status", patch(bulk_reward_status))
        .route("/api/rewards/:id", get(get_reward))
        .route("/api/rewards/:id", patch(update_reward))
        .route("/api/rewards/:id", delete(delete_reward))
}

// Assignment/redemption routes
pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/rewards/assign", post(assign_reward))
        .route("/api/rewards/:id/redeem", post(redeem_reward))
        .route(
            "/api/rewards/assignments/:id/cancel",
            post(cancel_assignment),
        )
        .route("/api/rewards/users", get(get_own_rewards))
        .route("/api/rewards/users/:user_id", get(get_user_rewards))
}

// Analytics routes
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/rewards/analytics", get(get_analytics))
        .route("/api/rewards/system-stats", get(get_system_stats))
}

// Settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/api/rewards/settings", get(get_settings))
        .route("/api/rewards/settings", put(update_settings))
        .route("/api/rewards/settings/reset", post(reset_settings))
}
