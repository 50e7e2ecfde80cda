//! Audit logging collaborator.
//!
//! The reward flows record who did what to which reward. Logging is
//! fire-and-forget: a failing audit sink must never fail the primary
//! operation, so the trait cannot return an error.

use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Error,
}

#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Record one audit entry. `actor_email` and `request_context` are
    /// supplied by callers that have them; the reward services only know
    /// the actor id and the operation they are performing.
    #[allow(clippy::too_many_arguments)]
    async fn log(
        &self,
        level: AuditLevel,
        category: &str,
        message: &str,
        actor_id: Option<Uuid>,
        actor_email: Option<&str>,
        metadata: serde_json::Value,
        request_context: serde_json::Value,
    );
}

/// Production audit sink backed by the tracing subscriber, under the
/// dedicated `audit` target so it can be filtered and shipped separately.
pub struct TracingAuditLogger;

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(
        &self,
        level: AuditLevel,
        category: &str,
        message: &str,
        actor_id: Option<Uuid>,
        actor_email: Option<&str>,
        metadata: serde_json::Value,
        request_context: serde_json::Value,
    ) {
        match level {
            AuditLevel::Info => {
                tracing::info!(
                    target: "audit",
                    category,
                    actor_id = ?actor_id,
                    actor_email = ?actor_email,
                    %metadata,
                    %request_context,
                    "{message}"
                );
            }
            AuditLevel::Error => {
                tracing::error!(
                    target: "audit",
                    category,
                    actor_id = ?actor_id,
                    actor_email = ?actor_email,
                    %metadata,
                    %request_context,
                    "{message}"
                );
            }
        }
    }
}
