//! Incident lifecycle state machine.
//!
//! ```text
//! Open ──resolve──► Resolved ──sweep (grace elapsed, cause+origin)──► Archived
//! ```
//!
//! Status is never stored; it is derived from `resolved_at` / `archived_at`.
//! The `plan_*` functions validate a requested change against the current
//! record and return the [`IncidentPatch`] to write. They never mutate.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::incident::{Incident, IncidentDetails, IncidentPatch};
use crate::network::NetworkType;
use crate::roles::Actor;
use crate::types::{IncidentId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    Resolved,
    Archived,
}

impl IncidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Open => "open",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Archived => "archived",
        }
    }

    /// Resolved or archived.
    pub fn is_closed(self) -> bool {
        self != IncidentStatus::Open
    }

    /// Statuses reachable in one step from `self`.
    pub fn valid_transitions(self) -> &'static [IncidentStatus] {
        match self {
            IncidentStatus::Open => &[IncidentStatus::Resolved],
            IncidentStatus::Resolved => &[IncidentStatus::Archived],
            IncidentStatus::Archived => &[],
        }
    }

    pub fn can_transition(self, to: IncidentStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the status from the lifecycle timestamps.
pub fn derive_status(
    resolved_at: Option<Timestamp>,
    archived_at: Option<Timestamp>,
) -> IncidentStatus {
    match (resolved_at, archived_at) {
        (_, Some(_)) => IncidentStatus::Archived,
        (Some(_), None) => IncidentStatus::Resolved,
        (None, None) => IncidentStatus::Open,
    }
}

// ---------------------------------------------------------------------------
// Transition records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Resolved,
    Archived,
    CorrectionFlagged,
    CorrectionCleared,
    DetailsRecorded,
}

impl TransitionKind {
    /// Event name published for this transition.
    pub fn event_type(self) -> &'static str {
        match self {
            TransitionKind::Resolved => "incident.resolved",
            TransitionKind::Archived => "incident.archived",
            TransitionKind::CorrectionFlagged => "incident.correction_flagged",
            TransitionKind::CorrectionCleared => "incident.correction_cleared",
            TransitionKind::DetailsRecorded => "incident.details_recorded",
        }
    }
}

/// The observable lifecycle state: status plus the correction side flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleState {
    pub status: IncidentStatus,
    pub correction_flagged: bool,
}

impl LifecycleState {
    pub fn of(incident: &Incident) -> Self {
        Self {
            status: incident.status(),
            correction_flagged: incident.correction_flag,
        }
    }
}

/// One applied state change, handed to the audit collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub incident_id: IncidentId,
    pub network_type: NetworkType,
    pub kind: TransitionKind,
    pub actor: Actor,
    pub before: LifecycleState,
    pub after: LifecycleState,
    pub at: Timestamp,
}

impl TransitionRecord {
    /// Build a record from the incident before and after the write.
    pub fn between(
        kind: TransitionKind,
        actor: Actor,
        before: &Incident,
        after: &Incident,
        at: Timestamp,
    ) -> Self {
        Self {
            incident_id: after.id,
            network_type: after.network_type,
            kind,
            actor,
            before: LifecycleState::of(before),
            after: LifecycleState::of(after),
            at,
        }
    }
}

// ---------------------------------------------------------------------------
// Open -> Resolved
// ---------------------------------------------------------------------------

/// Validate marking an incident resolved at `resolved_at`.
pub fn plan_resolve(incident: &Incident, resolved_at: Timestamp) -> Result<IncidentPatch, CoreError> {
    let from = incident.status();
    if !from.can_transition(IncidentStatus::Resolved) {
        return Err(CoreError::InvalidTransition {
            action: "resolve",
            from,
        });
    }
    if resolved_at < incident.created_at {
        return Err(CoreError::InvalidTimestamp(format!(
            "resolution time {resolved_at} precedes incident start {}",
            incident.created_at
        )));
    }
    Ok(IncidentPatch {
        resolved_at: Some(resolved_at),
        ..Default::default()
    })
}

// ---------------------------------------------------------------------------
// Resolved -> Archived
// ---------------------------------------------------------------------------

/// Whether an incident may be archived at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveEligibility {
    Eligible,
    /// Still open.
    NotResolved,
    AlreadyArchived,
    /// Grace interval still running until `eligible_at`.
    NotYet { eligible_at: Timestamp },
    /// Grace elapsed but a required explanation is missing. The incident
    /// stays resolved until someone fills it in.
    Blocked { missing: &'static str },
}

pub fn archive_eligibility(
    incident: &Incident,
    now: Timestamp,
    grace: Duration,
) -> ArchiveEligibility {
    let resolved_at = match (incident.resolved_at, incident.archived_at) {
        (_, Some(_)) => return ArchiveEligibility::AlreadyArchived,
        (None, None) => return ArchiveEligibility::NotResolved,
        (Some(at), None) => at,
    };

    // An unrepresentable deadline is never reached.
    let eligible_at = resolved_at
        .checked_add_signed(grace)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    if now < eligible_at {
        return ArchiveEligibility::NotYet { eligible_at };
    }
    if !incident.has_cause() {
        return ArchiveEligibility::Blocked { missing: "cause" };
    }
    if !incident.has_origin() {
        return ArchiveEligibility::Blocked { missing: "origin" };
    }
    ArchiveEligibility::Eligible
}

/// Validate archiving an incident at `now` on behalf of `actor`.
pub fn plan_archive(
    incident: &Incident,
    now: Timestamp,
    grace: Duration,
    actor: &Actor,
) -> Result<IncidentPatch, CoreError> {
    match archive_eligibility(incident, now, grace) {
        ArchiveEligibility::Eligible => Ok(IncidentPatch {
            archived_at: Some(now),
            archived_by: Some(actor.id),
            ..Default::default()
        }),
        ArchiveEligibility::NotResolved => Err(CoreError::InvalidTransition {
            action: "archive",
            from: IncidentStatus::Open,
        }),
        ArchiveEligibility::AlreadyArchived => Err(CoreError::InvalidTransition {
            action: "archive",
            from: IncidentStatus::Archived,
        }),
        ArchiveEligibility::NotYet { eligible_at } => Err(CoreError::InvalidTimestamp(format!(
            "archival is not allowed before {eligible_at}"
        ))),
        ArchiveEligibility::Blocked { missing } => Err(CoreError::MissingField(missing)),
    }
}

// ---------------------------------------------------------------------------
// Descriptive fields
// ---------------------------------------------------------------------------

/// Validate replacing cause/origin on a not-yet-archived incident.
pub fn plan_record_details(
    incident: &Incident,
    details: &IncidentDetails,
) -> Result<IncidentPatch, CoreError> {
    let from = incident.status();
    if from == IncidentStatus::Archived {
        return Err(CoreError::InvalidTransition {
            action: "edit",
            from,
        });
    }
    Ok(IncidentPatch {
        details: Some(details.cleaned()),
        ..Default::default()
    })
}
