//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod audit_repo;
pub mod incident_repo;

pub use audit_repo::AuditRepo;
pub use incident_repo::IncidentRepo;
