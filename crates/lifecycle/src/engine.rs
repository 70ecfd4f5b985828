//! On-demand read path and user-triggered transitions.

use std::sync::Arc;

use outagewatch_core::config::LifecycleConfig;
use outagewatch_core::correction;
use outagewatch_core::error::CoreError;
use outagewatch_core::incident::{Incident, IncidentDetails, IncidentPatch};
use outagewatch_core::lifecycle::{self, TransitionKind, TransitionRecord};
use outagewatch_core::network::NetworkType;
use outagewatch_core::roles::Actor;
use outagewatch_core::severity::Severity;
use outagewatch_core::store::{IncidentFilter, IncidentStore};
use outagewatch_core::summary::{IncidentSummary, StatusFilter};
use outagewatch_core::types::{IncidentId, Timestamp};
use outagewatch_events::{EventBus, PlatformEvent};

use crate::view::IncidentView;

/// How many times a write is retried after losing a version race.
pub(crate) const MAX_CAS_ATTEMPTS: u32 = 3;

pub struct LifecycleEngine<S> {
    pub(crate) store: Arc<S>,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) config: LifecycleConfig,
}

impl<S> Clone for LifecycleEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            bus: Arc::clone(&self.bus),
            config: self.config,
        }
    }
}

impl<S: IncidentStore> LifecycleEngine<S> {
    pub fn new(store: Arc<S>, bus: Arc<EventBus>, config: LifecycleConfig) -> Self {
        Self { store, bus, config }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    /// Current derived state of one incident.
    pub async fn view(&self, id: IncidentId, now: Timestamp) -> Result<IncidentView, CoreError> {
        let incident = self.store.get(id).await?;
        Ok(IncidentView::derive(incident, now, &self.config))
    }

    /// Derived state of every incident matching `filter` and, optionally, a
    /// status/severity filter.
    pub async fn list(
        &self,
        filter: &IncidentFilter,
        status: Option<StatusFilter>,
        now: Timestamp,
    ) -> Result<Vec<IncidentView>, CoreError> {
        let mut filter = *filter;
        if status.is_some_and(StatusFilter::needs_archived) {
            filter.include_archived = true;
        }
        let views = self
            .store
            .list(&filter)
            .await?
            .into_iter()
            .map(|incident| IncidentView::derive(incident, now, &self.config))
            .filter(|view| status.map_or(true, |s| s.matches(view.status, view.severity)))
            .collect();
        Ok(views)
    }

    /// Dashboard counts, archived incidents included.
    pub async fn summary(
        &self,
        network_type: Option<NetworkType>,
        now: Timestamp,
    ) -> Result<IncidentSummary, CoreError> {
        let filter = IncidentFilter {
            network_type,
            include_archived: true,
        };
        let views = self.list(&filter, None, now).await?;
        Ok(IncidentSummary::from_states(
            views.iter().map(|v| (v.status, v.severity)),
        ))
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Mark an open incident resolved at `resolved_at`.
    pub async fn resolve(
        &self,
        id: IncidentId,
        resolved_at: Timestamp,
        actor: Actor,
        now: Timestamp,
    ) -> Result<IncidentView, CoreError> {
        self.transition(id, TransitionKind::Resolved, actor, now, |incident| {
            let mut patch = lifecycle::plan_resolve(incident, resolved_at)?;
            patch.severity_snapshot = Some(Severity::Green);
            Ok(patch)
        })
        .await
    }

    /// Replace cause/origin (and their free-text companions).
    pub async fn record_details(
        &self,
        id: IncidentId,
        details: IncidentDetails,
        actor: Actor,
        now: Timestamp,
    ) -> Result<IncidentView, CoreError> {
        self.transition(id, TransitionKind::DetailsRecorded, actor, now, |incident| {
            lifecycle::plan_record_details(incident, &details)
        })
        .await
    }

    /// Ask an administrator to review this incident.
    pub async fn flag_correction(
        &self,
        id: IncidentId,
        note: Option<String>,
        actor: Actor,
        now: Timestamp,
    ) -> Result<IncidentView, CoreError> {
        self.transition(id, TransitionKind::CorrectionFlagged, actor, now, |incident| {
            correction::plan_flag(incident, note.as_deref())
        })
        .await
    }

    /// Close an open correction request. Administrators only.
    pub async fn clear_correction(
        &self,
        id: IncidentId,
        actor: Actor,
        now: Timestamp,
    ) -> Result<IncidentView, CoreError> {
        self.transition(id, TransitionKind::CorrectionCleared, actor, now, |incident| {
            correction::plan_clear(incident, &actor)
        })
        .await
    }

    /// Read, plan, compare-and-set; retried when another writer got there
    /// first. Planning errors go straight back to the caller.
    async fn transition<F>(
        &self,
        id: IncidentId,
        kind: TransitionKind,
        actor: Actor,
        now: Timestamp,
        plan: F,
    ) -> Result<IncidentView, CoreError>
    where
        F: Fn(&Incident) -> Result<IncidentPatch, CoreError>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let before = self.store.get(id).await?;
            let patch = plan(&before).inspect_err(|e| {
                tracing::info!(
                    incident_id = %id,
                    actor = actor.id,
                    transition = kind.event_type(),
                    error = %e,
                    "Transition rejected"
                );
            })?;

            match self.store.update(id, before.version, &patch).await {
                Ok(after) => {
                    let record = TransitionRecord::between(kind, actor, &before, &after, now);
                    self.record(&record);
                    return Ok(IncidentView::derive(after, now, &self.config));
                }
                Err(CoreError::Conflict(reason)) if attempt < MAX_CAS_ATTEMPTS => {
                    tracing::debug!(incident_id = %id, attempt, %reason, "Retrying after version conflict");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Log a transition and hand it to the audit collaborator.
    pub(crate) fn record(&self, record: &TransitionRecord) {
        tracing::info!(
            incident_id = %record.incident_id,
            network_type = %record.network_type,
            actor = record.actor.id,
            from = %record.before.status,
            to = %record.after.status,
            transition = record.kind.event_type(),
            "Incident transition applied"
        );
        self.bus.publish(PlatformEvent::from_transition(record));
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use outagewatch_core::lifecycle::IncidentStatus;

    use super::*;
    use crate::memory::InMemoryIncidentStore;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 7, 7, 7, 0, 0).unwrap()
    }

    async fn engine_with(incident: Incident) -> (LifecycleEngine<InMemoryIncidentStore>, IncidentId) {
        let store = Arc::new(InMemoryIncidentStore::new());
        let id = store.insert(incident).await;
        let engine = LifecycleEngine::new(store, Arc::new(EventBus::default()), LifecycleConfig::default());
        (engine, id)
    }

    #[tokio::test]
    async fn resolve_publishes_event_and_turns_green() {
        let (engine, id) = engine_with(Incident::new(NetworkType::Core, t0())).await;
        let mut rx = engine.bus.subscribe();

        let at = t0() + Duration::hours(3);
        let view = engine.resolve(id, at, Actor::user(4), at).await.unwrap();
        assert_eq!(view.status, IncidentStatus::Resolved);
        assert_eq!(view.severity, Severity::Green);
        assert_eq!(view.incident.severity_snapshot, Some(Severity::Green));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, "incident.resolved");
        assert_eq!(event.source_entity_id, Some(id));
        assert_eq!(event.actor_user_id, Some(4));
    }

    #[tokio::test]
    async fn rejected_transition_publishes_nothing() {
        let (engine, id) = engine_with(Incident::new(NetworkType::Core, t0())).await;
        let mut rx = engine.bus.subscribe();

        let err = engine
            .resolve(id, t0() - Duration::minutes(5), Actor::user(4), t0())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::InvalidTimestamp(_));
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.view(id, t0()).await.unwrap().status, IncidentStatus::Open);
    }

    #[tokio::test]
    async fn correction_cycle() {
        let (engine, id) = engine_with(Incident::new(NetworkType::Transport, t0())).await;

        let flagged = engine
            .flag_correction(id, Some("wrong extremity".into()), Actor::user(2), t0())
            .await
            .unwrap();
        assert!(flagged.incident.correction_flag);

        assert_matches!(
            engine.flag_correction(id, None, Actor::user(3), t0()).await,
            Err(CoreError::InvalidTransition { .. })
        );
        assert_matches!(
            engine.clear_correction(id, Actor::user(2), t0()).await,
            Err(CoreError::Forbidden(_))
        );

        let cleared = engine.clear_correction(id, Actor::admin(1), t0()).await.unwrap();
        assert!(!cleared.incident.correction_flag);
        assert_eq!(cleared.incident.correction_note, None);

        // A new review cycle may start.
        assert!(engine.flag_correction(id, None, Actor::user(3), t0()).await.is_ok());
    }

    #[tokio::test]
    async fn list_filters_by_severity_band() {
        let store = Arc::new(InMemoryIncidentStore::new());
        let now = t0() + Duration::hours(5);
        let red = store.insert(Incident::new(NetworkType::Core, t0())).await;
        store
            .insert(Incident::new(NetworkType::Core, now - Duration::minutes(10)))
            .await;
        let engine = LifecycleEngine::new(store, Arc::new(EventBus::default()), LifecycleConfig::default());

        let critical = engine
            .list(&IncidentFilter::unarchived(), Some(StatusFilter::Critical), now)
            .await
            .unwrap();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].incident.id, red);

        let summary = engine.summary(None, now).await.unwrap();
        assert_eq!(summary.open, 2);
        assert_eq!(summary.severity_counts.red, 1);
        assert_eq!(summary.severity_counts.white, 1);
    }

    #[tokio::test]
    async fn missing_incident_is_not_found() {
        let (engine, _) = engine_with(Incident::new(NetworkType::Core, t0())).await;
        let other = IncidentId::new_v4();
        assert_matches!(engine.view(other, t0()).await, Err(CoreError::NotFound(id)) if id == other);
    }
}
