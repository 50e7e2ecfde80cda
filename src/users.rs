//! User directory collaborator.
//!
//! The platform owns user accounts; this engine only reads identity. The
//! trait keeps the directory swappable for tests and for deployments where
//! accounts live behind another service.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::UserAccount;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<UserAccount>, sqlx::Error>;
}

/// Directory backed by the platform's `users` table.
pub struct PgUserDirectory {
    db_pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_user_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<UserAccount>, sqlx::Error> {
        sqlx::query_as::<_, UserAccount>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
    }
}
