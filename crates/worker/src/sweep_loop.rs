//! Background sweep loop.
//!
//! Runs [`LifecycleEngine::sweep`] on a fixed interval using
//! `tokio::time::interval` until the cancellation token fires. A sweep
//! never fails as a whole, so the loop only stops on shutdown.

use std::time::Duration;

use chrono::Utc;
use outagewatch_core::store::IncidentStore;
use outagewatch_lifecycle::LifecycleEngine;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the sweep loop. Returns the number of sweeps performed.
pub async fn run<S>(engine: LifecycleEngine<S>, every: Duration, cancel: CancellationToken) -> u64
where
    S: IncidentStore + 'static,
{
    tracing::info!(interval_secs = every.as_secs(), "Sweep loop started");

    let mut interval = tokio::time::interval(every);
    // No catch-up burst after a slow sweep.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sweeps = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(sweeps, "Sweep loop stopping");
                break;
            }
            _ = interval.tick() => {
                let report = engine.sweep(Utc::now()).await;
                sweeps += 1;
                if !report.is_clean() {
                    tracing::warn!(
                        failures = report.failures.len(),
                        "Sweep finished with failures, affected incidents are retried next tick"
                    );
                }
            }
        }
    }

    sweeps
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;
    use outagewatch_core::config::LifecycleConfig;
    use outagewatch_core::incident::Incident;
    use outagewatch_core::lifecycle::IncidentStatus;
    use outagewatch_core::network::NetworkType;
    use outagewatch_core::roles::Actor;
    use outagewatch_events::EventBus;
    use outagewatch_lifecycle::InMemoryIncidentStore;

    use super::*;

    #[tokio::test]
    async fn stops_on_cancel() {
        let engine = LifecycleEngine::new(
            Arc::new(InMemoryIncidentStore::new()),
            Arc::new(EventBus::default()),
            LifecycleConfig::default(),
        );
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(engine, Duration::from_secs(3600), cancel.clone()));

        cancel.cancel();
        let sweeps = handle.await.unwrap();
        assert!(sweeps <= 1);
    }

    #[tokio::test]
    async fn first_tick_archives_eligible_incidents() {
        let store = Arc::new(InMemoryIncidentStore::new());
        let engine = LifecycleEngine::new(
            Arc::clone(&store),
            Arc::new(EventBus::default()),
            LifecycleConfig::default(),
        );

        let started = Utc::now() - ChronoDuration::hours(6);
        let mut incident = Incident::new(NetworkType::Transport, started);
        incident.resolved_at = Some(started + ChronoDuration::hours(1));
        incident.cause = Some("Fiber cut".into());
        incident.origin = Some("Road works".into());
        let id = store.insert(incident).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(engine.clone(), Duration::from_secs(3600), cancel.clone()));

        // The first interval tick completes immediately.
        for _ in 0..50 {
            let view = engine.view(id, Utc::now()).await.unwrap();
            if view.status == IncidentStatus::Archived {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        assert!(handle.await.unwrap() >= 1);

        let view = engine.view(id, Utc::now()).await.unwrap();
        assert_eq!(view.status, IncidentStatus::Archived);
        assert_eq!(view.incident.archived_by, Some(Actor::system().id));
    }
}
