#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use outagewatch_core::config::LifecycleConfig;
use outagewatch_core::incident::Incident;
use outagewatch_core::network::NetworkType;
use outagewatch_core::types::{IncidentId, Timestamp};
use outagewatch_events::{EventBus, PlatformEvent};
use outagewatch_lifecycle::{InMemoryIncidentStore, LifecycleEngine};
use tokio::sync::broadcast;

/// Fixed reference instant `T` for scenario tests.
pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap()
}

pub fn at(minutes: i64) -> Timestamp {
    t0() + Duration::minutes(minutes)
}

pub struct Harness {
    pub engine: LifecycleEngine<InMemoryIncidentStore>,
    pub store: Arc<InMemoryIncidentStore>,
    pub events: broadcast::Receiver<PlatformEvent>,
}

/// Engine over an empty in-memory store with default thresholds.
pub fn harness() -> Harness {
    let store = Arc::new(InMemoryIncidentStore::new());
    let bus = Arc::new(EventBus::default());
    let events = bus.subscribe();
    let engine = LifecycleEngine::new(Arc::clone(&store), bus, LifecycleConfig::default());
    Harness {
        engine,
        store,
        events,
    }
}

impl Harness {
    /// Report a new open incident started at `created_at`.
    pub async fn open(&self, network: NetworkType, created_at: Timestamp) -> IncidentId {
        self.store.insert(Incident::new(network, created_at)).await
    }

    /// Drain every event published so far.
    pub fn drain_events(&mut self) -> Vec<PlatformEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
