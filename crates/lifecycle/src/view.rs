//! Read-only derived state handed to the presentation layer.

use chrono::Duration;
use outagewatch_core::config::LifecycleConfig;
use outagewatch_core::duration::{self, format_duration, reference_instant};
use outagewatch_core::incident::Incident;
use outagewatch_core::lifecycle::IncidentStatus;
use outagewatch_core::severity::{classify, Severity};
use outagewatch_core::types::Timestamp;
use serde::Serialize;

/// An incident together with everything derived from it at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentView {
    pub incident: Incident,
    pub status: IncidentStatus,
    pub severity: Severity,
    pub elapsed_minutes: i64,
    pub duration_display: String,
    pub css_class: &'static str,
    pub severity_label: &'static str,
    pub cause_display: String,
    pub origin_display: String,
}

impl IncidentView {
    /// Derive status, severity and duration as of `now`.
    pub fn derive(incident: Incident, now: Timestamp, config: &LifecycleConfig) -> Self {
        let status = incident.status();
        let elapsed = elapsed_or_zero(&incident, now);
        let severity = classify(status, elapsed, &config.thresholds);
        Self {
            status,
            severity,
            elapsed_minutes: duration::whole_minutes(elapsed),
            duration_display: format_duration(elapsed),
            css_class: severity.css_class(),
            severity_label: severity.label(),
            cause_display: incident.cause_display(),
            origin_display: incident.origin_display(),
            incident,
        }
    }
}

/// Elapsed open time, clamped to zero (with a warning) on clock skew.
pub fn elapsed_or_zero(incident: &Incident, now: Timestamp) -> Duration {
    let reference = reference_instant(incident.resolved_at, now);
    match duration::elapsed(incident.created_at, reference) {
        Ok(elapsed) => elapsed,
        Err(e) => {
            tracing::warn!(
                incident_id = %incident.id,
                error = %e,
                "Incident starts after its reference instant, clamping duration to zero"
            );
            Duration::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use outagewatch_core::network::NetworkType;

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 9, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn open_incident_view() {
        let inc = Incident::new(NetworkType::FileAccess, t0());
        let view = IncidentView::derive(inc, t0() + Duration::minutes(150), &LifecycleConfig::default());
        assert_eq!(view.status, IncidentStatus::Open);
        assert_eq!(view.severity, Severity::Orange);
        assert_eq!(view.elapsed_minutes, 150);
        assert_eq!(view.duration_display, "2h 30m");
        assert_eq!(view.css_class, "incident-medium");
    }

    #[test]
    fn resolved_duration_stops_at_resolution() {
        let mut inc = Incident::new(NetworkType::Core, t0());
        inc.resolved_at = Some(t0() + Duration::minutes(45));
        let view = IncidentView::derive(inc, t0() + Duration::days(3), &LifecycleConfig::default());
        assert_eq!(view.severity, Severity::Green);
        assert_eq!(view.duration_display, "45m");
    }

    #[test]
    fn future_start_is_clamped() {
        let inc = Incident::new(NetworkType::Core, t0() + Duration::hours(1));
        let view = IncidentView::derive(inc, t0(), &LifecycleConfig::default());
        assert_eq!(view.elapsed_minutes, 0);
        assert_eq!(view.severity, Severity::White);
        assert_eq!(view.duration_display, "0m");
    }
}
