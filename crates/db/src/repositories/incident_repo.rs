//! Repository for the `incidents` table.

use outagewatch_core::incident::IncidentPatch;
use outagewatch_core::store::IncidentFilter;
use outagewatch_core::types::IncidentId;
use sqlx::PgPool;

use crate::models::incident::IncidentRow;

/// Column list for `incidents` queries.
const COLUMNS: &str = "\
    id, network_type, created_at, resolved_at, archived_at, archived_by, \
    cause, cause_other, origin, origin_other, \
    correction_flag, correction_note, severity_snapshot, version, updated_at";

/// Reads and version-checked updates for incidents.
pub struct IncidentRepo;

impl IncidentRepo {
    pub async fn find_by_id(pool: &PgPool, id: IncidentId) -> Result<Option<IncidentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM incidents WHERE id = $1");
        sqlx::query_as::<_, IncidentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List incidents matching `filter`, oldest first.
    pub async fn list(pool: &PgPool, filter: &IncidentFilter) -> Result<Vec<IncidentRow>, sqlx::Error> {
        let query = list_query(filter);
        let mut q = sqlx::query_as::<_, IncidentRow>(&query);
        if let Some(network) = filter.network_type {
            q = q.bind(network.as_str());
        }
        q.fetch_all(pool).await
    }

    /// Apply `patch` if the row is still at `expected_version`.
    ///
    /// Returns `None` when the row is missing or has moved on; the caller
    /// tells the two apart with [`find_by_id`](Self::find_by_id).
    pub async fn update_if_version(
        pool: &PgPool,
        id: IncidentId,
        expected_version: i64,
        patch: &IncidentPatch,
    ) -> Result<Option<IncidentRow>, sqlx::Error> {
        let query = format!(
            "UPDATE incidents SET \
                resolved_at = COALESCE($3, resolved_at), \
                archived_at = COALESCE($4, archived_at), \
                archived_by = COALESCE($5, archived_by), \
                cause        = CASE WHEN $6::boolean THEN $7  ELSE cause END, \
                cause_other  = CASE WHEN $6::boolean THEN $8  ELSE cause_other END, \
                origin       = CASE WHEN $6::boolean THEN $9  ELSE origin END, \
                origin_other = CASE WHEN $6::boolean THEN $10 ELSE origin_other END, \
                correction_flag = COALESCE($11, correction_flag), \
                correction_note = CASE WHEN $11::boolean IS NULL THEN correction_note ELSE $12 END, \
                severity_snapshot = COALESCE($13, severity_snapshot), \
                version = version + 1, \
                updated_at = NOW() \
             WHERE id = $1 AND version = $2 \
             RETURNING {COLUMNS}"
        );

        let details = patch.details.clone().unwrap_or_default();
        let correction = patch.correction.as_ref();

        sqlx::query_as::<_, IncidentRow>(&query)
            .bind(id)
            .bind(expected_version)
            .bind(patch.resolved_at)
            .bind(patch.archived_at)
            .bind(patch.archived_by)
            .bind(patch.details.is_some())
            .bind(details.cause)
            .bind(details.cause_other)
            .bind(details.origin)
            .bind(details.origin_other)
            .bind(correction.map(|c| c.flagged))
            .bind(correction.and_then(|c| c.note.clone()))
            .bind(patch.severity_snapshot.map(|s| s.as_str()))
            .fetch_optional(pool)
            .await
    }
}

/// Build the `SELECT` for [`IncidentRepo::list`]. The network type, when
/// present, is bound as `$1`.
fn list_query(filter: &IncidentFilter) -> String {
    let mut conditions: Vec<&str> = Vec::new();
    if filter.network_type.is_some() {
        conditions.push("network_type = $1");
    }
    if !filter.include_archived {
        conditions.push("archived_at IS NULL");
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {} ", conditions.join(" AND "))
    };

    format!("SELECT {COLUMNS} FROM incidents {where_clause}ORDER BY created_at ASC")
}
