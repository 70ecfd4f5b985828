//! Elapsed-time calculation and the `"1d 2h 3m"` display format.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// The instant an incident's duration is measured up to: the resolution
/// instant when there is one, otherwise `now`.
pub fn reference_instant(resolved_at: Option<Timestamp>, now: Timestamp) -> Timestamp {
    resolved_at.unwrap_or(now)
}

/// Time elapsed between `start` and `reference`.
///
/// Fails with [`CoreError::InvalidRange`] when `reference` precedes `start`
/// (clock skew or bad data). Read paths are expected to clamp that case to
/// zero rather than propagate it.
pub fn elapsed(start: Timestamp, reference: Timestamp) -> Result<Duration, CoreError> {
    if reference < start {
        return Err(CoreError::InvalidRange { start, reference });
    }
    Ok(reference - start)
}

/// Duration floored to whole minutes. Negative input yields zero.
pub fn whole_minutes(d: Duration) -> i64 {
    d.num_minutes().max(0)
}

/// Age in fractional hours, for display.
pub fn age_hours(d: Duration) -> f64 {
    (d.num_seconds().max(0) as f64) / 3600.0
}

/// Format a duration as `"{days}d {hours}h {minutes}m"`.
///
/// Leading zero units are omitted; minutes are always shown. Seconds are
/// floored away, never rounded up.
pub fn format_duration(d: Duration) -> String {
    let total = whole_minutes(d);
    let days = total / MINUTES_PER_DAY;
    let hours = (total % MINUTES_PER_DAY) / MINUTES_PER_HOUR;
    let minutes = total % MINUTES_PER_HOUR;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn elapsed_is_difference() {
        let d = elapsed(t0(), t0() + Duration::minutes(95)).unwrap();
        assert_eq!(d, Duration::minutes(95));
    }

    #[test]
    fn elapsed_zero_at_start() {
        assert_eq!(elapsed(t0(), t0()).unwrap(), Duration::zero());
    }

    #[test]
    fn elapsed_rejects_reference_before_start() {
        let err = elapsed(t0(), t0() - Duration::seconds(1)).unwrap_err();
        assert_matches!(err, CoreError::InvalidRange { .. });
    }

    #[test]
    fn elapsed_never_negative_on_success() {
        for secs in [0, 1, 59, 3600, 86_400 * 40] {
            let d = elapsed(t0(), t0() + Duration::seconds(secs)).unwrap();
            assert!(d >= Duration::zero());
        }
    }

    #[test]
    fn reference_prefers_resolution() {
        let resolved = t0() + Duration::hours(3);
        let now = t0() + Duration::hours(9);
        assert_eq!(reference_instant(Some(resolved), now), resolved);
        assert_eq!(reference_instant(None, now), now);
    }

    #[test]
    fn format_zero() {
        assert_eq!(format_duration(Duration::zero()), "0m");
    }

    #[test]
    fn format_floors_seconds() {
        assert_eq!(format_duration(Duration::seconds(119)), "1m");
        assert_eq!(format_duration(Duration::seconds(59)), "0m");
    }

    #[test]
    fn format_omits_leading_zero_units_only() {
        assert_eq!(format_duration(Duration::minutes(90)), "1h 30m");
        assert_eq!(format_duration(Duration::minutes(60)), "1h 0m");
        assert_eq!(format_duration(Duration::minutes(24 * 60 + 5)), "1d 0h 5m");
        assert_eq!(
            format_duration(Duration::days(2) + Duration::hours(3) + Duration::minutes(4)),
            "2d 3h 4m"
        );
    }

    #[test]
    fn format_negative_is_zero() {
        assert_eq!(format_duration(Duration::minutes(-10)), "0m");
    }

    #[test]
    fn age_hours_is_fractional() {
        assert!((age_hours(Duration::minutes(90)) - 1.5).abs() < f64::EPSILON);
        assert_eq!(age_hours(Duration::minutes(-5)), 0.0);
    }
}
