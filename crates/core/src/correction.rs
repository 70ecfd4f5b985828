//! Correction-request flag.
//!
//! Any authenticated user may ask an administrator to review an incident's
//! recorded facts. The flag is orthogonal to status, but archived incidents
//! are frozen and cannot be flagged or cleared.

use crate::error::CoreError;
use crate::incident::{clean_field, CorrectionState, Incident, IncidentPatch, OTHER_MAX_LEN};
use crate::lifecycle::IncidentStatus;
use crate::roles::Actor;

/// Maximum stored length of a correction note.
pub const NOTE_MAX_LEN: usize = 4 * OTHER_MAX_LEN;

/// Validate raising the correction flag.
///
/// Fails if the incident is archived or already has an open correction
/// request (one flag per review cycle).
pub fn plan_flag(incident: &Incident, note: Option<&str>) -> Result<IncidentPatch, CoreError> {
    ensure_not_archived(incident, "flag for correction")?;
    if incident.correction_flag {
        return Err(CoreError::InvalidTransition {
            action: "flag for correction",
            from: incident.status(),
        });
    }
    Ok(IncidentPatch {
        correction: Some(CorrectionState {
            flagged: true,
            note: clean_field(note, NOTE_MAX_LEN),
        }),
        ..Default::default()
    })
}

/// Validate clearing the correction flag after review.
pub fn plan_clear(incident: &Incident, actor: &Actor) -> Result<IncidentPatch, CoreError> {
    actor.require_privileged("clear correction requests")?;
    ensure_not_archived(incident, "clear the correction flag of")?;
    if !incident.correction_flag {
        return Err(CoreError::InvalidTransition {
            action: "clear the correction flag of",
            from: incident.status(),
        });
    }
    Ok(IncidentPatch {
        correction: Some(CorrectionState {
            flagged: false,
            note: None,
        }),
        ..Default::default()
    })
}

fn ensure_not_archived(incident: &Incident, action: &'static str) -> Result<(), CoreError> {
    let from = incident.status();
    if from == IncidentStatus::Archived {
        return Err(CoreError::InvalidTransition { action, from });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::network::NetworkType;

    fn incident() -> Incident {
        Incident::new(
            NetworkType::RadioAccess,
            Utc.with_ymd_and_hms(2026, 2, 2, 2, 0, 0).unwrap(),
        )
    }

    #[test]
    fn user_can_flag_open_incident() {
        let patch = plan_flag(&incident(), Some(" wrong site ")).unwrap();
        let correction = patch.correction.unwrap();
        assert!(correction.flagged);
        assert_eq!(correction.note.as_deref(), Some("wrong site"));
    }

    #[test]
    fn flag_can_be_raised_on_resolved_incident() {
        let mut inc = incident();
        inc.resolved_at = Some(inc.created_at + Duration::hours(1));
        assert!(plan_flag(&inc, None).is_ok());
    }

    #[test]
    fn second_flag_in_same_cycle_is_rejected() {
        let mut inc = incident();
        inc.correction_flag = true;
        assert_matches!(
            plan_flag(&inc, None),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn archived_incident_cannot_be_flagged() {
        let mut inc = incident();
        inc.resolved_at = Some(inc.created_at);
        inc.archived_at = Some(inc.created_at + Duration::hours(2));
        assert_matches!(
            plan_flag(&inc, None),
            Err(CoreError::InvalidTransition { from: IncidentStatus::Archived, .. })
        );
    }

    #[test]
    fn only_admin_can_clear() {
        let mut inc = incident();
        inc.correction_flag = true;
        assert_matches!(
            plan_clear(&inc, &Actor::user(5)),
            Err(CoreError::Forbidden(_))
        );
        let patch = plan_clear(&inc, &Actor::admin(1)).unwrap();
        assert_eq!(
            patch.correction,
            Some(CorrectionState {
                flagged: false,
                note: None
            })
        );
    }

    #[test]
    fn clearing_unflagged_incident_is_rejected() {
        assert_matches!(
            plan_clear(&incident(), &Actor::admin(1)),
            Err(CoreError::InvalidTransition { .. })
        );
    }
}
