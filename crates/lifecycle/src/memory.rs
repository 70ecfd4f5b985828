//! In-process [`IncidentStore`], for embedding and tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use outagewatch_core::error::CoreError;
use outagewatch_core::incident::{Incident, IncidentPatch};
use outagewatch_core::store::{IncidentFilter, IncidentStore};
use outagewatch_core::types::IncidentId;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryIncidentStore {
    records: RwLock<HashMap<IncidentId, Incident>>,
    /// Ids whose reads and writes fail with `StoreUnavailable`.
    unavailable: RwLock<HashSet<IncidentId>>,
}

impl InMemoryIncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `incident` as is, replacing any record with the same id.
    pub async fn insert(&self, incident: Incident) -> IncidentId {
        let id = incident.id;
        self.records.write().await.insert(id, incident);
        id
    }

    /// Make every operation on `id` fail until [`restore`](Self::restore).
    pub async fn make_unavailable(&self, id: IncidentId) {
        self.unavailable.write().await.insert(id);
    }

    pub async fn restore(&self, id: IncidentId) {
        self.unavailable.write().await.remove(&id);
    }

    /// Copy of every stored record, archived included.
    pub async fn snapshot(&self) -> Vec<Incident> {
        let mut all: Vec<Incident> = self.records.read().await.values().cloned().collect();
        all.sort_by_key(|i| (i.created_at, i.id));
        all
    }

    async fn check_available(&self, id: IncidentId) -> Result<(), CoreError> {
        if self.unavailable.read().await.contains(&id) {
            return Err(CoreError::StoreUnavailable(format!(
                "incident {id} is unreachable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn get(&self, id: IncidentId) -> Result<Incident, CoreError> {
        self.check_available(id).await?;
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound(id))
    }

    async fn list(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, CoreError> {
        let mut matching: Vec<Incident> = self
            .records
            .read()
            .await
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        matching.sort_by_key(|i| (i.created_at, i.id));
        Ok(matching)
    }

    async fn update(
        &self,
        id: IncidentId,
        expected_version: i64,
        patch: &IncidentPatch,
    ) -> Result<Incident, CoreError> {
        self.check_available(id).await?;
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(CoreError::NotFound(id))?;
        if record.version != expected_version {
            return Err(CoreError::Conflict(format!(
                "incident {id} is at version {}, expected {expected_version}",
                record.version
            )));
        }
        record.apply(patch);
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use outagewatch_core::network::NetworkType;

    use super::*;

    #[tokio::test]
    async fn update_requires_matching_version() {
        let store = InMemoryIncidentStore::new();
        let id = store
            .insert(Incident::new(NetworkType::Core, Utc::now()))
            .await;
        let patch = IncidentPatch {
            archived_by: Some(1),
            ..Default::default()
        };

        let updated = store.update(id, 0, &patch).await.unwrap();
        assert_eq!(updated.version, 1);

        assert_matches!(
            store.update(id, 0, &patch).await,
            Err(CoreError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryIncidentStore::new();
        let id = outagewatch_core::types::IncidentId::new_v4();
        assert_matches!(store.get(id).await, Err(CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn unavailable_record_fails_until_restored() {
        let store = InMemoryIncidentStore::new();
        let id = store
            .insert(Incident::new(NetworkType::Transport, Utc::now()))
            .await;
        store.make_unavailable(id).await;
        assert_matches!(store.get(id).await, Err(CoreError::StoreUnavailable(_)));
        store.restore(id).await;
        assert!(store.get(id).await.is_ok());
    }
}
