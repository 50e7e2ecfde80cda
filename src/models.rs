//! Shared API models for the RankPay rewards backend

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ApiError;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Pagination parameters common to all list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

impl PaginationParams {
    /// Clamp to sane bounds: page >= 1, 1 <= limit <= 100.
    pub fn normalize(&self) -> (i32, i32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        (page, limit)
    }
}

/// Paginated response
#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i32,
    pub limit: i32,
}

/// User row as surfaced by the user directory
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Caller identity injected by the fronting authentication layer.
///
/// Authentication itself is out of scope here; the gateway in front of this
/// service resolves the session and forwards the user id in `X-User-Id`.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("X-User-Id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::InvalidArgument("Missing X-User-Id header".to_string())
            })?;

        let id = Uuid::parse_str(raw).map_err(|_| {
            ApiError::InvalidArgument("Malformed X-User-Id header".to_string())
        })?;

        Ok(Caller(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_bounds() {
        let params = PaginationParams {
            page: None,
            limit: None,
        };
        assert_eq!(params.normalize(), (1, 20));

        let params = PaginationParams {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(params.normalize(), (1, 100));

        let params = PaginationParams {
            page: Some(3),
            limit: Some(-5),
        };
        assert_eq!(params.normalize(), (3, 1));
    }
}
