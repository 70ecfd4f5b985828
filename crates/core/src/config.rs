//! Tunable lifecycle thresholds.
//!
//! The defaults are the fixed operating rules: severity escalates at 1h, 2h
//! and 4h of open time, and resolved incidents are archived 2h after
//! resolution. Deployments may override them, but the values must stay
//! strictly increasing.

use chrono::Duration;

use crate::error::CoreError;

/// Open incidents turn Yellow after this long.
pub const DEFAULT_YELLOW_AFTER_MINUTES: i64 = 60;

/// Open incidents turn Orange after this long.
pub const DEFAULT_ORANGE_AFTER_MINUTES: i64 = 120;

/// Open incidents turn Red after this long.
pub const DEFAULT_RED_AFTER_MINUTES: i64 = 240;

/// Wait between resolution and archival.
pub const DEFAULT_ARCHIVE_GRACE_MINUTES: i64 = 120;

/// Upper bound for any threshold: one year.
pub const MAX_THRESHOLD_MINUTES: i64 = 365 * 24 * 60;

/// Lower bounds (inclusive) of the open-incident severity bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityThresholds {
    pub yellow_after: Duration,
    pub orange_after: Duration,
    pub red_after: Duration,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            yellow_after: Duration::minutes(DEFAULT_YELLOW_AFTER_MINUTES),
            orange_after: Duration::minutes(DEFAULT_ORANGE_AFTER_MINUTES),
            red_after: Duration::minutes(DEFAULT_RED_AFTER_MINUTES),
        }
    }
}

impl SeverityThresholds {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.yellow_after <= Duration::zero() {
            return Err(CoreError::Validation(
                "yellow threshold must be positive".to_string(),
            ));
        }
        if self.orange_after <= self.yellow_after {
            return Err(CoreError::Validation(
                "orange threshold must be later than yellow".to_string(),
            ));
        }
        if self.red_after <= self.orange_after {
            return Err(CoreError::Validation(
                "red threshold must be later than orange".to_string(),
            ));
        }
        check_upper_bound("red threshold", self.red_after)
    }
}

/// All thresholds the lifecycle engine consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub thresholds: SeverityThresholds,
    pub archive_grace: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            thresholds: SeverityThresholds::default(),
            archive_grace: Duration::minutes(DEFAULT_ARCHIVE_GRACE_MINUTES),
        }
    }
}

impl LifecycleConfig {
    /// Build a config from minute values, validating the result.
    pub fn from_minutes(
        yellow: i64,
        orange: i64,
        red: i64,
        archive_grace: i64,
    ) -> Result<Self, CoreError> {
        let config = Self {
            thresholds: SeverityThresholds {
                yellow_after: minutes("yellow threshold", yellow)?,
                orange_after: minutes("orange threshold", orange)?,
                red_after: minutes("red threshold", red)?,
            },
            archive_grace: minutes("archive grace interval", archive_grace)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.thresholds.validate()?;
        if self.archive_grace < Duration::zero() {
            return Err(CoreError::Validation(
                "archive grace interval cannot be negative".to_string(),
            ));
        }
        check_upper_bound("archive grace interval", self.archive_grace)
    }
}

fn minutes(name: &str, value: i64) -> Result<Duration, CoreError> {
    Duration::try_minutes(value).ok_or_else(|| {
        CoreError::Validation(format!("{name} of {value} minutes is out of range"))
    })
}

fn check_upper_bound(name: &str, value: Duration) -> Result<(), CoreError> {
    if value > Duration::minutes(MAX_THRESHOLD_MINUTES) {
        return Err(CoreError::Validation(format!(
            "{name} cannot exceed {MAX_THRESHOLD_MINUTES} minutes"
        )));
    }
    Ok(())
}
