//! Audit log insert model.

use outagewatch_core::types::{DbId, IncidentId, Timestamp};

/// DTO for appending an audit entry.
#[derive(Debug, Clone)]
pub struct NewAuditEntry<'a> {
    pub event_type: &'a str,
    pub incident_id: Option<IncidentId>,
    pub actor_user_id: Option<DbId>,
    pub payload: &'a serde_json::Value,
    pub occurred_at: Timestamp,
}
