//! Domain rules for network outage incidents.
//!
//! Everything in this crate is pure: no I/O, no clocks. Callers pass the
//! current instant in explicitly so every rule is reproducible in tests.

pub mod config;
pub mod correction;
pub mod duration;
pub mod error;
pub mod incident;
pub mod lifecycle;
pub mod network;
pub mod roles;
pub mod severity;
pub mod store;
pub mod summary;
pub mod types;
