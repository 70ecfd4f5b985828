//! The seam between the lifecycle engine and whatever persists incidents.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::incident::{Incident, IncidentPatch};
use crate::network::NetworkType;
use crate::types::IncidentId;

/// Which stored incidents to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    pub network_type: Option<NetworkType>,
    pub include_archived: bool,
}

impl IncidentFilter {
    /// Every incident the sweep still has to look at.
    pub fn unarchived() -> Self {
        Self::default()
    }

    pub fn for_network(network_type: NetworkType) -> Self {
        Self {
            network_type: Some(network_type),
            include_archived: false,
        }
    }

    pub fn with_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        if let Some(network) = self.network_type {
            if incident.network_type != network {
                return false;
            }
        }
        self.include_archived || incident.archived_at.is_none()
    }
}

/// Incident record store.
///
/// The store is the single source of truth. `update` must be atomic per
/// record: it applies `patch` only when the stored version still equals
/// `expected_version`, and fails with [`CoreError::Conflict`] otherwise.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn get(&self, id: IncidentId) -> Result<Incident, CoreError>;

    async fn list(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, CoreError>;

    /// Apply `patch` and return the updated record.
    async fn update(
        &self,
        id: IncidentId,
        expected_version: i64,
        patch: &IncidentPatch,
    ) -> Result<Incident, CoreError>;
}
