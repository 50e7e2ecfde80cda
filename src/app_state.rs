//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::analytics_service::AnalyticsService;
use crate::assignment_service::AssignmentService;
use crate::audit::{AuditLogger, TracingAuditLogger};
use crate::catalog_service::CatalogService;
use crate::settings_service::SettingsService;
use crate::users::{PgUserDirectory, UserDirectory};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog_service: Arc<CatalogService>,
    pub assignment_service: Arc<AssignmentService>,
    pub settings_service: Arc<SettingsService>,
    pub analytics_service: Arc<AnalyticsService>,
}

impl AppState {
    /// State with the production collaborators: the Postgres-backed user
    /// directory and the tracing audit sink.
    pub fn new(db_pool: PgPool) -> Self {
        let users: Arc<dyn UserDirectory> =
            Arc::new(PgUserDirectory::new(db_pool.clone()));
        let audit: Arc<dyn AuditLogger> = Arc::new(TracingAuditLogger);
        Self::with_collaborators(db_pool, users, audit)
    }

    pub fn with_collaborators(
        db_pool: PgPool,
        users: Arc<dyn UserDirectory>,
        audit: Arc<dyn AuditLogger>,
    ) -> Self {
        Self {
            catalog_service: Arc::new(CatalogService::new(db_pool.clone())),
            assignment_service: Arc::new(AssignmentService::new(
                db_pool.clone(),
                users,
                audit,
            )),
            settings_service: Arc::new(SettingsService::new(db_pool.clone())),
            analytics_service: Arc::new(AnalyticsService::new(db_pool)),
        }
    }
}

impl FromRef<AppState> for Arc<CatalogService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.catalog_service.clone()
    }
}

impl FromRef<AppState> for Arc<AssignmentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.assignment_service.clone()
    }
}

impl FromRef<AppState> for Arc<SettingsService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.settings_service.clone()
    }
}

impl FromRef<AppState> for Arc<AnalyticsService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.analytics_service.clone()
    }
}
