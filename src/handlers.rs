//! API handlers for the RankPay rewards backend

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::analytics_service::{RewardAnalytics, SystemStats};
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::ledger::{
    AssignRewardRequest, ListUserRewardsQuery, RedeemRewardRequest, UserReward,
};
use crate::models::{ApiResponse, Caller, Paginated};
use crate::reward::{
    BulkStatusRequest, BulkStatusResponse, CreateRewardRequest,
    ListRewardsQuery, RewardTemplate, UpdateRewardRequest,
};
use crate::settings::{RewardSettings, SettingsRecord};

// ===== Reward Catalog Handlers =====

/// List reward templates with filtering and pagination
pub async fn list_rewards(
    State(state): State<AppState>,
    Query(query): Query<ListRewardsQuery>,
) -> Result<Json<ApiResponse<Paginated<RewardTemplate>>>, ApiError> {
    let page = state.catalog_service.list(query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// Get a single reward template by ID
pub async fn get_reward(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RewardTemplate>>, ApiError> {
    let reward = state.catalog_service.get(id).await?;
    Ok(Json(ApiResponse::ok(reward)))
}

/// Create a new reward template
pub async fn create_reward(
    State(state): State<AppState>,
    Json(request): Json<CreateRewardRequest>,
) -> Result<Json<ApiResponse<RewardTemplate>>, ApiError> {
    request
        .validate()
        .map_err(|err| ApiError::InvalidArgument(err.to_string()))?;
    let reward = state.catalog_service.create(request).await?;
    Ok(Json(ApiResponse::ok(reward)))
}

/// Partially update a reward template
pub async fn update_reward(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateRewardRequest>,
) -> Result<Json<ApiResponse<RewardTemplate>>, ApiError> {
    patch
        .validate()
        .map_err(|err| ApiError::InvalidArgument(err.to_string()))?;
    let reward = state.catalog_service.update(id, patch).await?;
    Ok(Json(ApiResponse::ok(reward)))
}

/// Delete a reward template; historical ledger rows are untouched
pub async fn delete_reward(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.catalog_service.delete(id).await?;
    Ok(Json(ApiResponse::ok(())))
}

/// Toggle activation on a batch of reward templates
pub async fn bulk_reward_status(
    State(state): State<AppState>,
    Json(request): Json<BulkStatusRequest>,
) -> Result<Json<ApiResponse<BulkStatusResponse>>, ApiError> {
    let result = state
        .catalog_service
        .bulk_set_active(&request.ids, request.is_active)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

// ===== Assignment/Redemption Handlers =====

/// Assign a reward to a user
pub async fn assign_reward(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<AssignRewardRequest>,
) -> Result<Json<ApiResponse<UserReward>>, ApiError> {
    let row = state
        .assignment_service
        .assign(request, caller.0)
        .await?;
    Ok(Json(ApiResponse::ok(row)))
}

/// Redeem an assignment, with a code (assisted) or without (self-service)
pub async fn redeem_reward(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    caller: Caller,
    body: Option<Json<RedeemRewardRequest>>,
) -> Result<Json<ApiResponse<UserReward>>, ApiError> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let row = state
        .assignment_service
        .redeem(id, request.redemption_code.as_deref(), caller.0)
        .await?;
    Ok(Json(ApiResponse::ok(row)))
}

/// Cancel an assignment (external administrative override)
pub async fn cancel_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    caller: Caller,
) -> Result<Json<ApiResponse<UserReward>>, ApiError> {
    let row = state.assignment_service.cancel(id, caller.0).await?;
    Ok(Json(ApiResponse::ok(row)))
}

/// List the caller's own assignments
pub async fn get_own_rewards(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListUserRewardsQuery>,
) -> Result<Json<ApiResponse<Paginated<UserReward>>>, ApiError> {
    let page = state
        .assignment_service
        .get_user_rewards(None, caller.0, query)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// List a specific user's assignments
pub async fn get_user_rewards(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    caller: Caller,
    Query(query): Query<ListUserRewardsQuery>,
) -> Result<Json<ApiResponse<Paginated<UserReward>>>, ApiError> {
    let page = state
        .assignment_service
        .get_user_rewards(Some(&user_id), caller.0, query)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

// ===== Analytics Handlers =====

pub async fn get_analytics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RewardAnalytics>>, ApiError> {
    let analytics = state.analytics_service.reward_analytics().await?;
    Ok(Json(ApiResponse::ok(analytics)))
}

pub async fn get_system_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SystemStats>>, ApiError> {
    let stats = state.analytics_service.system_stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

// ===== Settings Handlers =====

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SettingsRecord>>, ApiError> {
    let record = state.settings_service.get().await?;
    Ok(Json(ApiResponse::ok(record)))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<RewardSettings>,
) -> Result<Json<ApiResponse<SettingsRecord>>, ApiError> {
    let record = state.settings_service.update(payload).await?;
    Ok(Json(ApiResponse::ok(record)))
}

pub async fn reset_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SettingsRecord>>, ApiError> {
    let record = state.settings_service.reset().await?;
    Ok(Json(ApiResponse::ok(record)))
}
