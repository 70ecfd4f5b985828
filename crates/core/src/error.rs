use crate::lifecycle::IncidentStatus;
use crate::types::{IncidentId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The reference instant lies before the start of the incident.
    #[error("Invalid range: reference {reference} precedes start {start}")]
    InvalidRange {
        start: Timestamp,
        reference: Timestamp,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid transition: cannot {action} an incident that is {from}")]
    InvalidTransition {
        action: &'static str,
        from: IncidentStatus,
    },

    #[error("Missing field: {0} must be filled in")]
    MissingField(&'static str),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Incident not found: {0}")]
    NotFound(IncidentId),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The record changed between read and write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    /// Whether retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Conflict(_))
    }
}
