//! The periodic sweep.
//!
//! For every unarchived incident: recompute severity, persist the snapshot
//! when it changed, and archive the incident when the grace interval has
//! passed and cause/origin are filled in. A record that fails is logged and
//! skipped; the rest of the sweep carries on.

use std::collections::BTreeMap;

use outagewatch_core::error::CoreError;
use outagewatch_core::incident::{Incident, IncidentPatch};
use outagewatch_core::lifecycle::{
    self, ArchiveEligibility, IncidentStatus, TransitionKind, TransitionRecord,
};
use outagewatch_core::network::NetworkType;
use outagewatch_core::roles::Actor;
use outagewatch_core::severity::{classify, Severity};
use outagewatch_core::store::{IncidentFilter, IncidentStore};
use outagewatch_core::types::{IncidentId, Timestamp};
use outagewatch_events::bus::{ENTITY_INCIDENT, INCIDENT_ESCALATED, SWEEP_COMPLETED};
use outagewatch_events::PlatformEvent;
use serde::Serialize;

use crate::engine::{LifecycleEngine, MAX_CAS_ATTEMPTS};
use crate::view::elapsed_or_zero;

/// What the sweep did to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Unchanged,
    /// Only the severity snapshot moved (e.g. first observation).
    SnapshotUpdated,
    Escalated { from: Severity, to: Severity },
    Archived,
    /// Eligible by time but missing an explanation; left resolved.
    Blocked { missing: &'static str },
}

/// Per-network breakdown of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkSweepStats {
    pub checked: u64,
    pub archived: u64,
    pub escalated: u64,
    pub blocked: u64,
    pub failed: u64,
}

/// A record (or a whole network listing) the sweep could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub network_type: NetworkType,
    pub incident_id: Option<IncidentId>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub at: Timestamp,
    pub checked: u64,
    pub archived: u64,
    pub escalated: u64,
    pub blocked: u64,
    pub by_network_type: BTreeMap<NetworkType, NetworkSweepStats>,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    fn new(at: Timestamp) -> Self {
        Self {
            at,
            checked: 0,
            archived: 0,
            escalated: 0,
            blocked: 0,
            by_network_type: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn tally(&mut self, network: NetworkType, outcome: RecordOutcome) {
        let stats = self.by_network_type.entry(network).or_default();
        stats.checked += 1;
        self.checked += 1;
        match outcome {
            RecordOutcome::Archived => {
                stats.archived += 1;
                self.archived += 1;
            }
            RecordOutcome::Escalated { .. } => {
                stats.escalated += 1;
                self.escalated += 1;
            }
            RecordOutcome::Blocked { .. } => {
                stats.blocked += 1;
                self.blocked += 1;
            }
            RecordOutcome::Unchanged | RecordOutcome::SnapshotUpdated => {}
        }
    }

    fn fail(&mut self, network: NetworkType, incident_id: Option<IncidentId>, error: &CoreError) {
        let stats = self.by_network_type.entry(network).or_default();
        stats.failed += 1;
        if incident_id.is_some() {
            stats.checked += 1;
            self.checked += 1;
        }
        self.failures.push(SweepFailure {
            network_type: network,
            incident_id,
            error: error.to_string(),
        });
    }
}

impl<S: IncidentStore> LifecycleEngine<S> {
    /// Run one sweep over every unarchived incident as of `now`.
    ///
    /// Running it twice with the same `now` changes nothing the second
    /// time. Never fails as a whole; see [`SweepReport::failures`].
    pub async fn sweep(&self, now: Timestamp) -> SweepReport {
        let mut report = SweepReport::new(now);

        for network in NetworkType::ALL {
            let incidents = match self.store.list(&IncidentFilter::for_network(network)).await {
                Ok(incidents) => incidents,
                Err(e) => {
                    tracing::error!(network_type = %network, error = %e, "Sweep: listing incidents failed");
                    report.fail(network, None, &e);
                    continue;
                }
            };

            report.by_network_type.entry(network).or_default();
            for incident in incidents {
                let id = incident.id;
                match self.sweep_record(incident, now).await {
                    Ok(outcome) => report.tally(network, outcome),
                    Err(e) => {
                        tracing::error!(incident_id = %id, network_type = %network, error = %e, "Sweep: record failed");
                        report.fail(network, Some(id), &e);
                    }
                }
            }
        }

        if report.checked == 0 && report.is_clean() {
            tracing::debug!("Sweep: no unarchived incidents");
        } else {
            tracing::info!(
                checked = report.checked,
                archived = report.archived,
                escalated = report.escalated,
                blocked = report.blocked,
                failures = report.failures.len(),
                "Sweep completed"
            );
        }

        if report.archived > 0 || report.escalated > 0 || !report.is_clean() {
            self.bus.publish(
                PlatformEvent::new(SWEEP_COMPLETED)
                    .with_actor(Actor::system().id)
                    .with_payload(serde_json::to_value(&report).unwrap_or_default())
                    .at(now),
            );
        }

        report
    }

    /// Recompute and persist one incident on demand, exactly as the sweep
    /// would.
    pub async fn refresh(&self, id: IncidentId, now: Timestamp) -> Result<RecordOutcome, CoreError> {
        let incident = self.store.get(id).await?;
        self.sweep_record(incident, now).await
    }

    async fn sweep_record(
        &self,
        mut incident: Incident,
        now: Timestamp,
    ) -> Result<RecordOutcome, CoreError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (patch, outcome) = self.plan_sweep(&incident, now);
            if let RecordOutcome::Blocked { missing } = outcome {
                tracing::debug!(
                    incident_id = %incident.id,
                    missing,
                    "Archival blocked until the incident is explained"
                );
            }
            if patch.is_empty() {
                return Ok(outcome);
            }

            match self.store.update(incident.id, incident.version, &patch).await {
                Ok(after) => {
                    self.announce(&incident, &after, outcome, now);
                    return Ok(outcome);
                }
                Err(CoreError::Conflict(reason)) if attempt < MAX_CAS_ATTEMPTS => {
                    tracing::debug!(incident_id = %incident.id, attempt, %reason, "Sweep: re-reading after version conflict");
                    incident = self.store.get(incident.id).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Decide what the sweep writes for `incident`. Pure.
    fn plan_sweep(&self, incident: &Incident, now: Timestamp) -> (IncidentPatch, RecordOutcome) {
        let system = Actor::system();
        let status = incident.status();
        if status == IncidentStatus::Archived {
            return (IncidentPatch::default(), RecordOutcome::Unchanged);
        }
        let elapsed = elapsed_or_zero(incident, now);
        let severity = classify(status, elapsed, &self.config.thresholds);

        let mut patch = IncidentPatch::default();
        let mut outcome = RecordOutcome::Unchanged;

        if incident.severity_snapshot != Some(severity) {
            patch.severity_snapshot = Some(severity);
            let previous = incident.severity_snapshot.unwrap_or(Severity::White);
            outcome = if severity.escalates_from(previous) {
                RecordOutcome::Escalated {
                    from: previous,
                    to: severity,
                }
            } else {
                RecordOutcome::SnapshotUpdated
            };
        }

        match lifecycle::archive_eligibility(incident, now, self.config.archive_grace) {
            ArchiveEligibility::Eligible => {
                if let Ok(archive) =
                    lifecycle::plan_archive(incident, now, self.config.archive_grace, &system)
                {
                    patch.archived_at = archive.archived_at;
                    patch.archived_by = archive.archived_by;
                    outcome = RecordOutcome::Archived;
                }
            }
            ArchiveEligibility::Blocked { missing } => {
                outcome = RecordOutcome::Blocked { missing };
            }
            _ => {}
        }

        (patch, outcome)
    }

    fn announce(&self, before: &Incident, after: &Incident, outcome: RecordOutcome, now: Timestamp) {
        match outcome {
            RecordOutcome::Archived => {
                let record = TransitionRecord::between(
                    TransitionKind::Archived,
                    Actor::system(),
                    before,
                    after,
                    now,
                );
                self.record(&record);
            }
            RecordOutcome::Escalated { from, to } => {
                tracing::info!(
                    incident_id = %after.id,
                    network_type = %after.network_type,
                    %from,
                    %to,
                    "Incident severity escalated"
                );
                self.bus.publish(
                    PlatformEvent::new(INCIDENT_ESCALATED)
                        .with_source(ENTITY_INCIDENT, after.id)
                        .with_actor(Actor::system().id)
                        .with_payload(serde_json::json!({
                            "network_type": after.network_type,
                            "from": from,
                            "to": to,
                        }))
                        .at(now),
                );
            }
            RecordOutcome::SnapshotUpdated
            | RecordOutcome::Unchanged
            | RecordOutcome::Blocked { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use outagewatch_core::config::LifecycleConfig;
    use outagewatch_events::EventBus;

    use super::*;
    use crate::memory::InMemoryIncidentStore;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap()
    }

    fn engine() -> LifecycleEngine<InMemoryIncidentStore> {
        LifecycleEngine::new(
            Arc::new(InMemoryIncidentStore::new()),
            Arc::new(EventBus::default()),
            LifecycleConfig::default(),
        )
    }

    #[test]
    fn first_observation_of_white_is_not_an_escalation() {
        let engine = engine();
        let inc = Incident::new(NetworkType::Core, t0());
        let (patch, outcome) = engine.plan_sweep(&inc, t0() + Duration::minutes(5));
        assert_eq!(patch.severity_snapshot, Some(Severity::White));
        assert_eq!(outcome, RecordOutcome::SnapshotUpdated);
    }

    #[test]
    fn band_change_is_an_escalation() {
        let engine = engine();
        let mut inc = Incident::new(NetworkType::Core, t0());
        inc.severity_snapshot = Some(Severity::Yellow);
        let (_, outcome) = engine.plan_sweep(&inc, t0() + Duration::hours(2));
        assert_eq!(
            outcome,
            RecordOutcome::Escalated {
                from: Severity::Yellow,
                to: Severity::Orange
            }
        );
    }

    #[test]
    fn settled_record_needs_no_write() {
        let engine = engine();
        let mut inc = Incident::new(NetworkType::Core, t0());
        inc.severity_snapshot = Some(Severity::Red);
        let (patch, outcome) = engine.plan_sweep(&inc, t0() + Duration::hours(9));
        assert!(patch.is_empty());
        assert_eq!(outcome, RecordOutcome::Unchanged);
    }

    #[test]
    fn blocked_resolution_is_reported() {
        let engine = engine();
        let mut inc = Incident::new(NetworkType::Core, t0());
        inc.resolved_at = Some(t0() + Duration::hours(1));
        inc.severity_snapshot = Some(Severity::Green);
        let (patch, outcome) = engine.plan_sweep(&inc, t0() + Duration::hours(4));
        assert!(patch.is_empty());
        assert_eq!(outcome, RecordOutcome::Blocked { missing: "cause" });
    }

    #[test]
    fn eligible_resolution_is_archived_by_system() {
        let engine = engine();
        let mut inc = Incident::new(NetworkType::Core, t0());
        inc.resolved_at = Some(t0() + Duration::hours(1));
        inc.cause = Some("Power".into());
        inc.origin = Some("Utility".into());
        inc.severity_snapshot = Some(Severity::Green);
        let now = t0() + Duration::hours(3);
        let (patch, outcome) = engine.plan_sweep(&inc, now);
        assert_eq!(outcome, RecordOutcome::Archived);
        assert_eq!(patch.archived_at, Some(now));
        assert_eq!(patch.archived_by, Some(Actor::system().id));
    }

    #[test]
    fn report_tallies_per_network() {
        let mut report = SweepReport::new(t0());
        report.tally(NetworkType::Core, RecordOutcome::Archived);
        report.tally(NetworkType::Core, RecordOutcome::Unchanged);
        report.tally(NetworkType::Transport, RecordOutcome::Blocked { missing: "origin" });
        report.fail(
            NetworkType::Transport,
            Some(IncidentId::new_v4()),
            &CoreError::StoreUnavailable("down".into()),
        );

        assert_eq!(report.checked, 4);
        assert_eq!(report.archived, 1);
        assert_eq!(report.blocked, 1);
        assert_eq!(report.by_network_type[&NetworkType::Core].checked, 2);
        assert_eq!(report.by_network_type[&NetworkType::Transport].failed, 1);
        assert!(!report.is_clean());
    }
}
