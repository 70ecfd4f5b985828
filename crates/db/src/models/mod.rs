//! Row models for the incident tables.

pub mod audit;
pub mod incident;
