//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`PlatformEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` between the lifecycle
//! engine and the audit sinks.

use chrono::Utc;
use outagewatch_core::lifecycle::TransitionRecord;
use outagewatch_core::types::{DbId, IncidentId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// Entity kind used for incident events.
pub const ENTITY_INCIDENT: &str = "incident";

/// Event emitted once per sweep with the aggregated report.
pub const SWEEP_COMPLETED: &str = "sweep.completed";

/// Event emitted when an open incident moves into a more urgent band.
pub const INCIDENT_ESCALATED: &str = "incident.escalated";

/// Something that happened to an incident (or to the engine itself).
///
/// Constructed via [`PlatformEvent::new`] and enriched with the builder
/// methods [`with_source`](PlatformEvent::with_source),
/// [`with_actor`](PlatformEvent::with_actor),
/// [`with_payload`](PlatformEvent::with_payload) and
/// [`at`](PlatformEvent::at).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"incident.resolved"`.
    pub event_type: String,

    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<IncidentId>,

    /// Id of the user (or the system actor) that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event happened (UTC).
    pub timestamp: Timestamp,
}

impl PlatformEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach a source entity to the event.
    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: IncidentId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Override the event time (defaults to the wall clock).
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The audit event for one lifecycle transition.
    pub fn from_transition(record: &TransitionRecord) -> Self {
        Self::new(record.kind.event_type())
            .with_source(ENTITY_INCIDENT, record.incident_id)
            .with_actor(record.actor.id)
            .with_payload(serde_json::json!({
                "network_type": record.network_type,
                "actor_role": record.actor.role,
                "before": record.before,
                "after": record.after,
            }))
            .at(record.at)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use outagewatch_events::bus::{EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new("incident.resolved"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: PlatformEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use outagewatch_core::incident::Incident;
    use outagewatch_core::lifecycle::{TransitionKind, TransitionRecord};
    use outagewatch_core::network::NetworkType;
    use outagewatch_core::roles::Actor;

    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let id = uuid::Uuid::new_v4();

        let event = PlatformEvent::new("incident.resolved")
            .with_source(ENTITY_INCIDENT, id)
            .with_actor(7)
            .with_payload(serde_json::json!({"key": "value"}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "incident.resolved");
        assert_eq!(received.source_entity_type.as_deref(), Some(ENTITY_INCIDENT));
        assert_eq!(received.source_entity_id, Some(id));
        assert_eq!(received.actor_user_id, Some(7));
        assert_eq!(received.payload["key"], "value");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(PlatformEvent::new(SWEEP_COMPLETED));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, SWEEP_COMPLETED);
        assert_eq!(e2.event_type, SWEEP_COMPLETED);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(PlatformEvent::new("orphan.event"));
    }

    #[test]
    fn transition_event_carries_before_and_after() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let before = Incident::new(NetworkType::Transport, start);
        let mut after = before.clone();
        after.resolved_at = Some(start + chrono::Duration::hours(2));
        let record = TransitionRecord::between(
            TransitionKind::Resolved,
            Actor::user(9),
            &before,
            &after,
            start + chrono::Duration::hours(2),
        );

        let event = PlatformEvent::from_transition(&record);
        assert_eq!(event.event_type, "incident.resolved");
        assert_eq!(event.source_entity_id, Some(before.id));
        assert_eq!(event.actor_user_id, Some(9));
        assert_eq!(event.timestamp, record.at);
        assert_eq!(event.payload["before"]["status"], "open");
        assert_eq!(event.payload["after"]["status"], "resolved");
        assert_eq!(event.payload["network_type"], "transport");
    }
}
