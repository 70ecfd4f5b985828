//! Incident row model.

use outagewatch_core::error::CoreError;
use outagewatch_core::incident::Incident;
use outagewatch_core::network::NetworkType;
use outagewatch_core::severity::Severity;
use outagewatch_core::types::{DbId, IncidentId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `incidents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IncidentRow {
    pub id: IncidentId,
    pub network_type: String,
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
    pub severity_snapshot: Option<String>,
    pub version: i64,
    pub updated_at: Timestamp,
}

impl TryFrom<IncidentRow> for Incident {
    type Error = CoreError;

    fn try_from(row: IncidentRow) -> Result<Self, Self::Error> {
        let network_type: NetworkType = row.network_type.parse()?;
        let severity_snapshot = row
            .severity_snapshot
            .as_deref()
            .map(str::parse::<Severity>)
            .transpose()?;

        Ok(Incident {
            id: row.id,
            network_type,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
            archived_at: row.archived_at,
            archived_by: row.archived_by,
            cause: row.cause,
            cause_other: row.cause_other,
            origin: row.origin,
            origin_other: row.origin_other,
            correction_flag: row.correction_flag,
            correction_note: row.correction_note,
            severity_snapshot,
            version: row.version,
        })
    }
}
