//! Incident event bus and audit sinks.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the event envelope for lifecycle transitions and
//!   sweep results.
//! - [`AuditLogger`]: writes every event to the structured log.
//! - [`AuditPersistence`]: writes every event to `incident_audit_log`.

pub mod audit;
pub mod bus;
pub mod persistence;

pub use audit::AuditLogger;
pub use bus::{EventBus, PlatformEvent};
pub use persistence::AuditPersistence;
