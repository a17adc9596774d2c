//! ChargingProfile domain entities
//!
//! Typed representation of the profile objects the engine resolves. The
//! serde shape matches the camelCase wire form the profiles arrive in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit of a charging schedule's limit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingRateUnit {
    /// Amperes per phase.
    #[serde(rename = "A")]
    Amps,
    /// Total power in watts.
    #[serde(rename = "W")]
    Watts,
}

/// Role a profile plays in limit resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingProfilePurpose {
    /// Hardware ceiling for the entire charge point (connector 0).
    ChargePointMaxProfile,
    /// Per-connector fallback while no transaction-specific profile applies.
    TxDefaultProfile,
    /// Transaction-specific profile, highest precedence when present.
    TxProfile,
}

impl ChargingProfilePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChargePointMaxProfile => "ChargePointMaxProfile",
            Self::TxDefaultProfile => "TxDefaultProfile",
            Self::TxProfile => "TxProfile",
        }
    }
}

/// How a profile's schedule is anchored in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingProfileKind {
    /// Anchored at the schedule's start timestamp.
    Absolute,
    /// Repeats from the start timestamp on a daily or weekly cadence.
    Recurring,
    /// Anchored at the start of the connector's active transaction.
    Relative,
}

/// Recurrence cadence for [`ChargingProfileKind::Recurring`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrencyKind {
    Daily,
    Weekly,
}

impl RecurrencyKind {
    /// Length of one recurrence in seconds. Also the hard cap on a recurring
    /// schedule's duration.
    pub fn period_seconds(&self) -> i64 {
        match self {
            Self::Daily => 86_400,
            Self::Weekly => 604_800,
        }
    }
}

/// One entry of a charging schedule.
///
/// Start offsets are strictly increasing within a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedulePeriod {
    /// Offset from the schedule's anchor time, in seconds.
    pub start_period: i64,
    /// Limit in the schedule's rate unit.
    pub limit: f64,
    /// Number of phases the limit applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_phases: Option<u32>,
}

/// A limit-over-time curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedule {
    pub charging_rate_unit: ChargingRateUnit,
    /// Wall-clock anchor for Absolute and Recurring profiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_schedule: Option<DateTime<Utc>>,
    /// Total schedule length in seconds; the last period is open-ended
    /// without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_charging_rate: Option<f64>,
    pub charging_schedule_period: Vec<ChargingSchedulePeriod>,
}

/// An installed charging profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingProfile {
    /// Unique profile ID.
    pub charging_profile_id: i32,
    /// Transaction this profile is bound to (TxProfile only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i32>,
    /// Stack level; within a purpose, higher overrides lower.
    pub stack_level: u32,
    pub charging_profile_purpose: ChargingProfilePurpose,
    pub charging_profile_kind: ChargingProfileKind,
    /// Required when the kind is Recurring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrency_kind: Option<RecurrencyKind>,
    /// Start of the validity window (inclusive).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window (exclusive).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    pub charging_schedule: ChargingSchedule,
}

impl ChargingProfile {
    /// True iff `t` lies inside the profile's validity window.
    pub fn is_valid_at(&self, t: DateTime<Utc>) -> bool {
        self.valid_from.map_or(true, |from| from <= t)
            && self.valid_to.map_or(true, |to| t < to)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample_profile() -> ChargingProfile {
        ChargingProfile {
            charging_profile_id: 7,
            transaction_id: None,
            stack_level: 1,
            charging_profile_purpose: ChargingProfilePurpose::TxDefaultProfile,
            charging_profile_kind: ChargingProfileKind::Absolute,
            recurrency_kind: None,
            valid_from: None,
            valid_to: None,
            charging_schedule: ChargingSchedule {
                charging_rate_unit: ChargingRateUnit::Amps,
                start_schedule: Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
                duration: Some(3600),
                min_charging_rate: None,
                charging_schedule_period: vec![ChargingSchedulePeriod {
                    start_period: 0,
                    limit: 16.0,
                    number_phases: Some(3),
                }],
            },
        }
    }

    #[test]
    fn serializes_to_wire_shape() {
        let json = serde_json::to_value(sample_profile()).unwrap();
        assert_eq!(json["chargingProfileId"], 7);
        assert_eq!(json["stackLevel"], 1);
        assert_eq!(json["chargingProfilePurpose"], "TxDefaultProfile");
        assert_eq!(json["chargingSchedule"]["chargingRateUnit"], "A");
        assert_eq!(
            json["chargingSchedule"]["chargingSchedulePeriod"][0]["startPeriod"],
            0
        );
        // absent options are omitted, not null
        assert!(json.get("transactionId").is_none());
        assert!(json.get("validFrom").is_none());
    }

    #[test]
    fn deserializes_from_wire_shape() {
        let profile: ChargingProfile = serde_json::from_str(
            r#"{
                "chargingProfileId": 11,
                "stackLevel": 0,
                "chargingProfilePurpose": "ChargePointMaxProfile",
                "chargingProfileKind": "Recurring",
                "recurrencyKind": "Weekly",
                "chargingSchedule": {
                    "chargingRateUnit": "W",
                    "startSchedule": "2024-06-01T00:00:00Z",
                    "chargingSchedulePeriod": [{"startPeriod": 0, "limit": 11000.0}]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(profile.charging_profile_id, 11);
        assert_eq!(profile.recurrency_kind, Some(RecurrencyKind::Weekly));
        assert_eq!(
            profile.charging_schedule.charging_rate_unit,
            ChargingRateUnit::Watts
        );
        assert!(profile.charging_schedule.duration.is_none());
    }

    #[test]
    fn validity_window_is_inclusive_exclusive() {
        let mut profile = sample_profile();
        let from = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        profile.valid_from = Some(from);
        profile.valid_to = Some(to);

        assert!(profile.is_valid_at(from));
        assert!(profile.is_valid_at(from + chrono::Duration::hours(12)));
        assert!(!profile.is_valid_at(to));
        assert!(!profile.is_valid_at(from - chrono::Duration::seconds(1)));
    }

    #[test]
    fn unbounded_profile_is_always_valid() {
        let profile = sample_profile();
        assert!(profile.is_valid_at(Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap()));
        assert!(profile.is_valid_at(Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn recurrency_period_lengths() {
        assert_eq!(RecurrencyKind::Daily.period_seconds(), 86_400);
        assert_eq!(RecurrencyKind::Weekly.period_seconds(), 7 * 86_400);
    }
}
