//! Repository for the `incident_audit_log` table.

use outagewatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::NewAuditEntry;

/// Append-only access to the audit trail.
pub struct AuditRepo;

impl AuditRepo {
    /// Append one entry, returning its id.
    pub async fn insert(pool: &PgPool, entry: &NewAuditEntry<'_>) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO incident_audit_log \
                (event_type, incident_id, actor_user_id, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(entry.event_type)
        .bind(entry.incident_id)
        .bind(entry.actor_user_id)
        .bind(entry.payload)
        .bind(entry.occurred_at)
        .fetch_one(pool)
        .await
    }
}
