//! Reward catalog service - CRUD over reward templates

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{is_unique_violation, ApiError};
use crate::models::{Paginated, PaginationParams};
use crate::reward::{
    BulkStatusResponse, CreateRewardRequest, ListRewardsQuery, RewardTemplate,
    UpdateRewardRequest,
};

/// Name of the partial unique index enforcing one active template per
/// (rank, reward_type).
const ACTIVE_RANK_TYPE_UQ: &str = "rewards_active_rank_type_uq";

pub struct CatalogService {
    db_pool: PgPool,
}

impl CatalogService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// List templates ordered by rank ascending, then most recently created
    /// first, with a total count for pagination.
    pub async fn list(
        &self,
        query: ListRewardsQuery,
    ) -> Result<Paginated<RewardTemplate>, ApiError> {
        let (page, limit) = PaginationParams {
            page: query.page,
            limit: query.limit,
        }
        .normalize();
        let offset = (page - 1) * limit;

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM rewards WHERE 1=1");
        push_list_filters(&mut count_builder, &query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM rewards WHERE 1=1");
        push_list_filters(&mut query_builder, &query);
        query_builder.push(" ORDER BY rank ASC, created_at DESC LIMIT ");
        query_builder.push_bind(limit as i64);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset as i64);

        let rewards = query_builder
            .build_query_as::<RewardTemplate>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(Paginated {
            data: rewards,
            total,
            page,
            limit,
        })
    }

    /// Get a single template by ID
    pub async fn get(&self, id: Uuid) -> Result<RewardTemplate, ApiError> {
        sqlx::query_as::<_, RewardTemplate>("SELECT * FROM rewards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Reward not found".to_string()))
    }

    /// Create a template. At most one active template may exist per
    /// (rank, reward_type); the pre-check gives a clean message, the partial
    /// unique index is the actual guard under concurrency.
    pub async fn create(
        &self,
        request: CreateRewardRequest,
    ) -> Result<RewardTemplate, ApiError> {
        if request.is_active {
            let taken: bool = sqlx::query_scalar(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM rewards
                    WHERE rank = $1 AND reward_type = $2 AND is_active
                )
                "#,
            )
            .bind(request.rank)
            .bind(request.reward_type)
            .fetch_one(&self.db_pool)
            .await?;

            if taken {
                return Err(ApiError::Conflict(
                    "An active reward already exists for this rank and type"
                        .to_string(),
                ));
            }
        }

        let now = Utc::now();
        let result = sqlx::query_as::<_, RewardTemplate>(
            r#"
            INSERT INTO rewards (
                name, description, reward_type, value, rank, is_active,
                auto_assign, max_redemptions, current_redemptions,
                valid_from, valid_until, conditions, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(request.description.as_deref())
        .bind(request.reward_type)
        .bind(Json(&request.value))
        .bind(request.rank)
        .bind(request.is_active)
        .bind(request.auto_assign)
        .bind(request.max_redemptions)
        .bind(request.valid_from)
        .bind(request.valid_until)
        .bind(Json(request.conditions))
        .bind(now)
        .fetch_one(&self.db_pool)
        .await;

        result.map_err(|err| {
            if is_unique_violation(&err, ACTIVE_RANK_TYPE_UQ) {
                ApiError::Conflict(
                    "An active reward already exists for this rank and type"
                        .to_string(),
                )
            } else {
                err.into()
            }
        })
    }

    /// Partially update a template; absent fields are left untouched.
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateRewardRequest,
    ) -> Result<RewardTemplate, ApiError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE rewards SET updated_at = ");
        builder.push_bind(Utc::now());

        if let Some(name) = &patch.name {
            builder.push(", name = ");
            builder.push_bind(name);
        }
        if let Some(description) = &patch.description {
            builder.push(", description = ");
            builder.push_bind(description);
        }
        if let Some(reward_type) = patch.reward_type {
            builder.push(", reward_type = ");
            builder.push_bind(reward_type);
        }
        if let Some(value) = &patch.value {
            builder.push(", value = ");
            builder.push_bind(Json(value));
        }
        if let Some(rank) = patch.rank {
            builder.push(", rank = ");
            builder.push_bind(rank);
        }
        if let Some(is_active) = patch.is_active {
            builder.push(", is_active = ");
            builder.push_bind(is_active);
        }
        if let Some(auto_assign) = patch.auto_assign {
            builder.push(", auto_assign = ");
            builder.push_bind(auto_assign);
        }
        if let Some(max_redemptions) = patch.max_redemptions {
            builder.push(", max_redemptions = ");
            builder.push_bind(max_redemptions);
        }
        if let Some(valid_from) = patch.valid_from {
            builder.push(", valid_from = ");
            builder.push_bind(valid_from);
        }
        if let Some(valid_until) = patch.valid_until {
            builder.push(", valid_until = ");
            builder.push_bind(valid_until);
        }
        if let Some(conditions) = patch.conditions {
            builder.push(", conditions = ");
            builder.push_bind(Json(conditions));
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING *");

        let result = builder
            .build_query_as::<RewardTemplate>()
            .fetch_optional(&self.db_pool)
            .await;

        match result {
            Ok(Some(reward)) => Ok(reward),
            Ok(None) => Err(ApiError::NotFound("Reward not found".to_string())),
            Err(err) if is_unique_violation(&err, ACTIVE_RANK_TYPE_UQ) => {
                Err(ApiError::Conflict(
                    "An active reward already exists for this rank and type"
                        .to_string(),
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Hard delete. Ledger rows referencing the template keep their
    /// snapshots and are not touched.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let deleted = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM rewards WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        match deleted {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound("Reward not found".to_string())),
        }
    }

    /// Toggle activation on a batch of templates. Unknown ids are silently
    /// skipped; only the modified count is reported.
    pub async fn bulk_set_active(
        &self,
        ids: &[Uuid],
        is_active: bool,
    ) -> Result<BulkStatusResponse, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE rewards
            SET is_active = $1, updated_at = $2
            WHERE id = ANY($3)
            "#,
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(ids)
        .execute(&self.db_pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err, ACTIVE_RANK_TYPE_UQ) {
                ApiError::Conflict(
                    "Activating these rewards would duplicate an active rank and type"
                        .to_string(),
                )
            } else {
                ApiError::from(err)
            }
        })?;

        Ok(BulkStatusResponse {
            modified: result.rows_affected(),
        })
    }
}

fn push_list_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &ListRewardsQuery,
) {
    if let Some(reward_type) = query.reward_type {
        builder.push(" AND reward_type = ");
        builder.push_bind(reward_type);
    }
    if let Some(is_active) = query.is_active {
        builder.push(" AND is_active = ");
        builder.push_bind(is_active);
    }
}
