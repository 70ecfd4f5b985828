/// Actor (user) ids are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Incidents are keyed by UUID so ids stay unique across the five network tables.
pub type IncidentId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
