//! [`IncidentStore`] backed by PostgreSQL.

use async_trait::async_trait;
use outagewatch_core::error::CoreError;
use outagewatch_core::incident::{Incident, IncidentPatch};
use outagewatch_core::store::{IncidentFilter, IncidentStore};
use outagewatch_core::types::IncidentId;

use crate::repositories::IncidentRepo;
use crate::{store_error, DbPool};

/// Incident store over the `incidents` table.
///
/// Atomicity comes from the single conditional `UPDATE … WHERE version = $2`.
#[derive(Clone)]
pub struct PgIncidentStore {
    pool: DbPool,
}

impl PgIncidentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl IncidentStore for PgIncidentStore {
    async fn get(&self, id: IncidentId) -> Result<Incident, CoreError> {
        IncidentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound(id))?
            .try_into()
    }

    async fn list(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, CoreError> {
        IncidentRepo::list(&self.pool, filter)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Incident::try_from)
            .collect()
    }

    async fn update(
        &self,
        id: IncidentId,
        expected_version: i64,
        patch: &IncidentPatch,
    ) -> Result<Incident, CoreError> {
        let updated = IncidentRepo::update_if_version(&self.pool, id, expected_version, patch)
            .await
            .map_err(store_error)?;

        match updated {
            Some(row) => row.try_into(),
            None => {
                // Distinguish a lost race from a vanished row.
                let current = IncidentRepo::find_by_id(&self.pool, id)
                    .await
                    .map_err(store_error)?;
                match current {
                    Some(row) => {
                        tracing::debug!(
                            incident_id = %id,
                            expected_version,
                            actual_version = row.version,
                            "Incident update lost a version race"
                        );
                        Err(CoreError::Conflict(format!(
                            "incident {id} is at version {}, expected {expected_version}",
                            row.version
                        )))
                    }
                    None => Err(CoreError::NotFound(id)),
                }
            }
        }
    }
}
