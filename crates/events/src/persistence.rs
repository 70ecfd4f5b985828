//! Durable audit trail.
//!
//! [`AuditPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every received [`PlatformEvent`] to `incident_audit_log`. It
//! runs as a long-lived background task and shuts down when the bus sender
//! is dropped or the cancellation token fires.

use outagewatch_core::types::DbId;
use outagewatch_db::models::audit::NewAuditEntry;
use outagewatch_db::repositories::AuditRepo;
use outagewatch_db::DbPool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::PlatformEvent;

pub struct AuditPersistence;

impl AuditPersistence {
    /// Run the persistence loop.
    pub async fn run(
        pool: DbPool,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Audit persistence stopping");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        if let Err(e) = Self::persist(&pool, &event).await {
                            tracing::error!(
                                error = %e,
                                event_type = %event.event_type,
                                "Failed to persist audit event"
                            );
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            skipped = n,
                            "Audit persistence lagged, some events were not persisted"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, audit persistence shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &PlatformEvent) -> Result<DbId, sqlx::Error> {
        AuditRepo::insert(
            pool,
            &NewAuditEntry {
                event_type: &event.event_type,
                incident_id: event.source_entity_id,
                actor_user_id: event.actor_user_id,
                payload: &event.payload,
                occurred_at: event.timestamp,
            },
        )
        .await
    }
}
