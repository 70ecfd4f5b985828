//! Structured-log audit sink.
//!
//! [`AuditLogger`] subscribes to the bus and emits one `tracing` event per
//! [`PlatformEvent`], so every transition shows up in the service log even
//! when the database sink is disabled.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::{PlatformEvent, SWEEP_COMPLETED};

pub struct AuditLogger;

impl AuditLogger {
    /// Run the logging loop until the bus closes or `cancel` fires.
    ///
    /// Returns the number of events logged.
    pub async fn run(
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) -> u64 {
        let mut logged = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(logged, "Audit logger stopping");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        Self::log(&event);
                        logged += 1;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Audit logger lagged, some events were not logged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!(logged, "Event bus closed, audit logger shutting down");
                        break;
                    }
                }
            }
        }
        logged
    }

    fn log(event: &PlatformEvent) {
        if event.event_type == SWEEP_COMPLETED {
            let failures = event.payload["failures"]
                .as_array()
                .map_or(0, Vec::len);
            if failures > 0 {
                tracing::warn!(
                    failures,
                    report = %event.payload,
                    "audit: sweep completed with failures"
                );
            } else {
                tracing::info!(report = %event.payload, "audit: sweep completed");
            }
            return;
        }

        tracing::info!(
            event_type = %event.event_type,
            incident_id = ?event.source_entity_id,
            actor = ?event.actor_user_id,
            before = %event.payload["before"],
            after = %event.payload["after"],
            at = %event.timestamp,
            "audit: incident transition"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;

    #[tokio::test]
    async fn logs_until_bus_closes() {
        let bus = EventBus::default();
        let rx = bus.subscribe();
        bus.publish(PlatformEvent::new("incident.resolved"));
        bus.publish(PlatformEvent::new(SWEEP_COMPLETED).with_payload(
            serde_json::json!({"failures": ["boom"]}),
        ));
        drop(bus);

        let logged = AuditLogger::run(rx, CancellationToken::new()).await;
        assert_eq!(logged, 2);
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let logged = AuditLogger::run(bus.subscribe(), cancel).await;
        assert_eq!(logged, 0);
    }
}
