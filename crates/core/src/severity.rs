//! Color-coded severity derived from lifecycle status and open time.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::config::SeverityThresholds;
use crate::error::CoreError;
use crate::lifecycle::IncidentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Open for less than an hour.
    White,
    Yellow,
    Orange,
    /// Open for four hours or more.
    Red,
    /// Resolved or archived.
    Green,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::White,
        Severity::Yellow,
        Severity::Orange,
        Severity::Red,
        Severity::Green,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::White => "white",
            Severity::Yellow => "yellow",
            Severity::Orange => "orange",
            Severity::Red => "red",
            Severity::Green => "green",
        }
    }

    /// CSS class the dashboard uses for row coloring.
    pub fn css_class(self) -> &'static str {
        match self {
            Severity::White => "incident-new",
            Severity::Yellow => "incident-low",
            Severity::Orange => "incident-medium",
            Severity::Red => "incident-critical",
            Severity::Green => "incident-resolved",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::White => "New",
            Severity::Yellow => "Low Severity",
            Severity::Orange => "Medium Severity",
            Severity::Red => "Critical",
            Severity::Green => "Resolved",
        }
    }

    /// Urgency rank among open bands. Green ranks below White since a
    /// resolved incident needs no attention.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Green => 0,
            Severity::White => 1,
            Severity::Yellow => 2,
            Severity::Orange => 3,
            Severity::Red => 4,
        }
    }

    /// True when moving from `previous` to `self` raises the urgency of a
    /// still-open incident.
    pub fn escalates_from(self, previous: Severity) -> bool {
        self != Severity::Green && self.rank() > previous.rank()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown severity '{s}'")))
    }
}

/// Classify an incident.
///
/// Resolved and archived incidents are always Green. Open incidents fall
/// into a band by elapsed time; each band includes its lower bound.
pub fn classify(
    status: IncidentStatus,
    elapsed: Duration,
    thresholds: &SeverityThresholds,
) -> Severity {
    if status.is_closed() {
        return Severity::Green;
    }
    if elapsed >= thresholds.red_after {
        Severity::Red
    } else if elapsed >= thresholds.orange_after {
        Severity::Orange
    } else if elapsed >= thresholds.yellow_after {
        Severity::Yellow
    } else {
        Severity::White
    }
}

/// [`classify`] with the default 1h/2h/4h bands.
pub fn classify_default(status: IncidentStatus, elapsed: Duration) -> Severity {
    classify(status, elapsed, &SeverityThresholds::default())
}
