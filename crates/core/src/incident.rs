//! The incident record and the field-level patch the engine writes back.

use serde::{Deserialize, Serialize};

use crate::lifecycle::{derive_status, IncidentStatus};
use crate::network::NetworkType;
use crate::severity::Severity;
use crate::types::{DbId, IncidentId, Timestamp};

/// Maximum length of the `cause` / `origin` selections.
pub const CHOICE_MAX_LEN: usize = 100;

/// Maximum length of the free-text `*_other` companions.
pub const OTHER_MAX_LEN: usize = 200;

/// Choice value that unlocks the free-text companion field.
const OTHER_CHOICE: &str = "other";

/// A network outage incident, as held by the record store.
///
/// `status` and `severity` are not stored: they are derived from
/// the timestamps on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub network_type: NetworkType,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub archived_at: Option<Timestamp>,
    pub archived_by: Option<DbId>,
    pub cause: Option<String>,
    pub cause_other: Option<String>,
    pub origin: Option<String>,
    pub origin_other: Option<String>,
    pub correction_flag: bool,
    pub correction_note: Option<String>,
    /// Last severity the engine persisted. Only used to detect escalations.
    pub severity_snapshot: Option<Severity>,
    /// Row version for compare-and-set updates.
    pub version: i64,
}

impl Incident {
    /// A freshly reported, open incident.
    pub fn new(network_type: NetworkType, created_at: Timestamp) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            network_type,
            created_at,
            resolved_at: None,
            archived_at: None,
            archived_by: None,
            cause: None,
            cause_other: None,
            origin: None,
            origin_other: None,
            correction_flag: false,
            correction_note: None,
            severity_snapshot: None,
            version: 0,
        }
    }

    pub fn status(&self) -> IncidentStatus {
        derive_status(self.resolved_at, self.archived_at)
    }

    pub fn has_cause(&self) -> bool {
        is_filled(self.cause.as_deref())
    }

    pub fn has_origin(&self) -> bool {
        is_filled(self.origin.as_deref())
    }

    pub fn cause_display(&self) -> String {
        choice_display(self.cause.as_deref(), self.cause_other.as_deref())
    }

    pub fn origin_display(&self) -> String {
        choice_display(self.origin.as_deref(), self.origin_other.as_deref())
    }

    /// Apply a patch in place and bump the version.
    pub fn apply(&mut self, patch: &IncidentPatch) {
        if let Some(at) = patch.resolved_at {
            self.resolved_at = Some(at);
        }
        if let Some(at) = patch.archived_at {
            self.archived_at = Some(at);
        }
        if let Some(by) = patch.archived_by {
            self.archived_by = Some(by);
        }
        if let Some(details) = &patch.details {
            self.cause = details.cause.clone();
            self.cause_other = details.cause_other.clone();
            self.origin = details.origin.clone();
            self.origin_other = details.origin_other.clone();
        }
        if let Some(correction) = &patch.correction {
            self.correction_flag = correction.flagged;
            self.correction_note = correction.note.clone();
        }
        if let Some(severity) = patch.severity_snapshot {
            self.severity_snapshot = Some(severity);
        }
        self.version += 1;
    }
}

/// Descriptive fields explaining an incident. Required before archival.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentDetails {
    pub cause: Option<String>,
    pub cause_other: Option<String>,
    pub origin: Option<String>,
    pub origin_other: Option<String>,
}

impl IncidentDetails {
    /// Trim, drop blanks and truncate every field to its column length.
    pub fn cleaned(&self) -> Self {
        Self {
            cause: clean_field(self.cause.as_deref(), CHOICE_MAX_LEN),
            cause_other: clean_field(self.cause_other.as_deref(), OTHER_MAX_LEN),
            origin: clean_field(self.origin.as_deref(), CHOICE_MAX_LEN),
            origin_other: clean_field(self.origin_other.as_deref(), OTHER_MAX_LEN),
        }
    }
}

/// State of the correction side flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionState {
    pub flagged: bool,
    pub note: Option<String>,
}

/// Fields the engine writes back. `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentPatch {
    pub resolved_at: Option<Timestamp>,
    pub archived_at: Option<Timestamp>,
    pub archived_by: Option<DbId>,
    pub details: Option<IncidentDetails>,
    pub correction: Option<CorrectionState>,
    pub severity_snapshot: Option<Severity>,
}

impl IncidentPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Trim a free-text value, returning `None` when nothing is left.
pub fn clean_field(value: Option<&str>, max_len: usize) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_len).collect())
}

fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn choice_display(choice: Option<&str>, other: Option<&str>) -> String {
    match choice {
        None => "Not specified".to_string(),
        Some(c) if c.trim().is_empty() => "Not specified".to_string(),
        Some(c) => match other {
            Some(o) if c.eq_ignore_ascii_case(OTHER_CHOICE) && !o.trim().is_empty() => {
                format!("Other: {}", o.trim())
            }
            _ => c.to_string(),
        },
    }
}
