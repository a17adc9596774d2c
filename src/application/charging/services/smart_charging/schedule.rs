//! Time and interval utilities for schedule computation

use chrono::{DateTime, Duration, Utc};

use crate::domain::{ChargingProfile, ChargingRateUnit, ChargingSchedule};

/// True iff the profile's validity window has a positive-duration
/// intersection with `[window_start, window_end)`.
pub fn validity_overlaps(
    profile: &ChargingProfile,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> bool {
    let from = profile.valid_from.unwrap_or(window_start);
    let to = profile.valid_to.unwrap_or(window_end);
    window_start.max(from) < window_end.min(to)
}

/// Convert a period limit to watts.
pub fn to_power_watts(
    limit: f64,
    number_phases: u32,
    unit: ChargingRateUnit,
    low_voltage: f64,
) -> f64 {
    match unit {
        ChargingRateUnit::Watts => limit,
        ChargingRateUnit::Amps => limit * low_voltage * number_phases as f64,
    }
}

/// Convert a limit in watts to the requested unit.
pub fn from_power_watts(
    watts: f64,
    number_phases: u32,
    unit: ChargingRateUnit,
    low_voltage: f64,
) -> f64 {
    match unit {
        ChargingRateUnit::Watts => watts,
        ChargingRateUnit::Amps => watts / (low_voltage * number_phases as f64),
    }
}

/// End of the period at `index`, given that period's own start time.
///
/// The boundary is the next period's offset, capped by the schedule's total
/// duration. `None` means the period is open-ended: it is the last one and
/// the schedule carries no duration.
pub fn period_end_time(
    schedule: &ChargingSchedule,
    index: usize,
    period_start: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let periods = &schedule.charging_schedule_period;
    let this = &periods[index];
    match periods.get(index + 1) {
        Some(next) => {
            let bound = match schedule.duration {
                Some(duration) => next.start_period.min(duration),
                None => next.start_period,
            };
            Some(period_start + Duration::seconds(bound - this.start_period))
        }
        None => schedule
            .duration
            .map(|duration| period_start + Duration::seconds(duration - this.start_period)),
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::{
        ChargingProfileKind, ChargingProfilePurpose, ChargingSchedulePeriod,
    };

    fn t(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    fn profile_with_window(
        valid_from: Option<DateTime<Utc>>,
        valid_to: Option<DateTime<Utc>>,
    ) -> ChargingProfile {
        ChargingProfile {
            charging_profile_id: 1,
            transaction_id: None,
            stack_level: 0,
            charging_profile_purpose: ChargingProfilePurpose::ChargePointMaxProfile,
            charging_profile_kind: ChargingProfileKind::Absolute,
            recurrency_kind: None,
            valid_from,
            valid_to,
            charging_schedule: schedule(None, vec![(0, 32.0)]),
        }
    }

    fn schedule(duration: Option<i64>, periods: Vec<(i64, f64)>) -> ChargingSchedule {
        ChargingSchedule {
            charging_rate_unit: ChargingRateUnit::Amps,
            start_schedule: Some(t(0, 0)),
            duration,
            min_charging_rate: None,
            charging_schedule_period: periods
                .into_iter()
                .map(|(start_period, limit)| ChargingSchedulePeriod {
                    start_period,
                    limit,
                    number_phases: None,
                })
                .collect(),
        }
    }

    #[test]
    fn overlap_requires_positive_intersection() {
        // window [08:00, 10:00)
        let start = t(8, 0);
        let end = t(10, 0);

        // unbounded profile always overlaps
        assert!(validity_overlaps(&profile_with_window(None, None), start, end));
        // partially inside
        assert!(validity_overlaps(
            &profile_with_window(Some(t(9, 0)), None),
            start,
            end
        ));
        assert!(validity_overlaps(
            &profile_with_window(None, Some(t(8, 30))),
            start,
            end
        ));
        // entirely before / after
        assert!(!validity_overlaps(
            &profile_with_window(None, Some(t(7, 0))),
            start,
            end
        ));
        assert!(!validity_overlaps(
            &profile_with_window(Some(t(10, 0)), None),
            start,
            end
        ));
        // touching the window edge is not an overlap
        assert!(!validity_overlaps(
            &profile_with_window(None, Some(t(8, 0))),
            start,
            end
        ));
    }

    #[test]
    fn amps_to_watts_and_back() {
        for phases in 1..=3u32 {
            let watts = to_power_watts(16.0, phases, ChargingRateUnit::Amps, 230.0);
            assert_eq!(watts, 16.0 * 230.0 * phases as f64);
            let amps = from_power_watts(watts, phases, ChargingRateUnit::Amps, 230.0);
            assert!((amps - 16.0).abs() < 1e-9);
        }
    }

    #[test]
    fn watts_conversion_is_identity() {
        assert_eq!(to_power_watts(7360.0, 3, ChargingRateUnit::Watts, 230.0), 7360.0);
        assert_eq!(from_power_watts(7360.0, 1, ChargingRateUnit::Watts, 230.0), 7360.0);
    }

    #[test]
    fn period_end_from_next_period() {
        let schedule = schedule(None, vec![(0, 32.0), (1800, 16.0)]);
        assert_eq!(
            period_end_time(&schedule, 0, t(0, 0)),
            Some(t(0, 30))
        );
    }

    #[test]
    fn duration_caps_next_period_boundary() {
        let schedule = schedule(Some(900), vec![(0, 32.0), (1800, 16.0)]);
        assert_eq!(
            period_end_time(&schedule, 0, t(0, 0)),
            Some(t(0, 15))
        );
    }

    #[test]
    fn last_period_ends_with_duration() {
        let schedule = schedule(Some(3600), vec![(0, 32.0), (1800, 16.0)]);
        // second period starts 1800s in, schedule ends at 3600s
        assert_eq!(
            period_end_time(&schedule, 1, t(0, 30)),
            Some(t(1, 0))
        );
    }

    #[test]
    fn last_period_without_duration_is_open_ended() {
        let schedule = schedule(None, vec![(0, 32.0)]);
        assert_eq!(period_end_time(&schedule, 0, t(0, 0)), None);
    }
}
