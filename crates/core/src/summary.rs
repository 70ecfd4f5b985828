//! Dashboard filters and counts over derived incident state.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::lifecycle::IncidentStatus;
use crate::severity::Severity;

/// Status filter offered by the incident list.
///
/// The severity-band variants only match open incidents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Active,
    Resolved,
    Archived,
    New,
    Low,
    Medium,
    Critical,
}

impl StatusFilter {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(Self::Active),
            "resolved" => Ok(Self::Resolved),
            "archived" => Ok(Self::Archived),
            "new" => Ok(Self::New),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "critical" => Ok(Self::Critical),
            other => Err(CoreError::Validation(format!(
                "Unknown status filter '{other}'"
            ))),
        }
    }

    pub fn matches(self, status: IncidentStatus, severity: Severity) -> bool {
        match self {
            Self::Active => status == IncidentStatus::Open,
            Self::Resolved => status == IncidentStatus::Resolved,
            Self::Archived => status == IncidentStatus::Archived,
            Self::New => severity == Severity::White,
            Self::Low => severity == Severity::Yellow,
            Self::Medium => severity == Severity::Orange,
            Self::Critical => severity == Severity::Red,
        }
    }

    /// Whether archived records need to be loaded at all.
    pub fn needs_archived(self) -> bool {
        self == Self::Archived
    }
}

/// Incidents per severity band. `green` counts resolved and archived ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub white: u64,
    pub yellow: u64,
    pub orange: u64,
    pub red: u64,
    pub green: u64,
}

/// Aggregate counts for a set of incidents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub total: u64,
    pub open: u64,
    pub resolved: u64,
    pub archived: u64,
    pub severity_counts: SeverityCounts,
    pub active_percentage: f64,
    pub resolved_percentage: f64,
}

impl IncidentSummary {
    /// Summarize `(status, severity)` pairs.
    ///
    /// "Resolved" percentage counts archived incidents too, since both are
    /// closed.
    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = (IncidentStatus, Severity)>,
    {
        let mut summary = Self::default();
        for (status, severity) in states {
            summary.total += 1;
            match status {
                IncidentStatus::Open => summary.open += 1,
                IncidentStatus::Resolved => summary.resolved += 1,
                IncidentStatus::Archived => summary.archived += 1,
            }
            let counts = &mut summary.severity_counts;
            match severity {
                Severity::White => counts.white += 1,
                Severity::Yellow => counts.yellow += 1,
                Severity::Orange => counts.orange += 1,
                Severity::Red => counts.red += 1,
                Severity::Green => counts.green += 1,
            }
        }
        summary.active_percentage = percentage(summary.open, summary.total);
        summary.resolved_percentage =
            percentage(summary.resolved + summary.archived, summary.total);
        summary
    }
}

/// Percentage rounded to one decimal place; zero for an empty set.
fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}
