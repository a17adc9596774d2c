//! Composite schedule calculation
//!
//! The sweep walks the requested window boundary-to-boundary. At every
//! instant the winning limit is resolved from the per-purpose stacks
//! (higher stack level wins within a purpose, TxProfile beats
//! TxDefaultProfile, the charge-point ceiling overrides both when lower),
//! and a new output period is emitted whenever the resolved limit changes.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::SmartChargingConfig;
use crate::domain::{
    ChargingProfile, ChargingProfileKind, ChargingProfilePurpose, ChargingRateUnit,
    ChargingSchedule, ChargingSchedulePeriod, TransactionRegistry,
};

use super::schedule::{from_power_watts, period_end_time, to_power_watts};

/// Composite schedule period annotated with the stack level that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedChargingSchedulePeriod {
    /// Offset from the window start in seconds.
    pub start_period: i64,
    /// Limit in the requested rate unit.
    pub limit: f64,
    pub number_phases: u32,
    /// Stack level of the winning profile. Diagnostic only; dropped from
    /// the external schedule.
    pub stack_level: u32,
}

/// Composite schedule with per-period provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedChargingSchedule {
    pub charging_rate_unit: ChargingRateUnit,
    pub start_schedule: DateTime<Utc>,
    /// Seconds the schedule covers; shrinks below the requested window when
    /// no profile constrains the tail.
    pub duration: i64,
    pub charging_schedule_period: Vec<EnhancedChargingSchedulePeriod>,
}

impl EnhancedChargingSchedule {
    /// External form of the schedule, without stack-level provenance.
    pub fn into_charging_schedule(self) -> ChargingSchedule {
        ChargingSchedule {
            charging_rate_unit: self.charging_rate_unit,
            start_schedule: Some(self.start_schedule),
            duration: Some(self.duration),
            min_charging_rate: None,
            charging_schedule_period: self
                .charging_schedule_period
                .into_iter()
                .map(|period| ChargingSchedulePeriod {
                    start_period: period.start_period,
                    limit: period.limit,
                    number_phases: Some(period.number_phases),
                })
                .collect(),
        }
    }
}

/// Currently-winning contribution for one purpose at one instant.
struct LimitStackLevelPair {
    /// Winning limit in watts; infinite while nothing contributed.
    limit: f64,
    /// Stack level that produced the limit; -1 while nothing contributed.
    stack_level: i64,
    number_phases: u32,
    /// When the contribution stops applying (`None` = unbounded).
    end: Option<DateTime<Utc>>,
}

impl LimitStackLevelPair {
    fn unset(default_phases: u32) -> Self {
        Self {
            limit: f64::INFINITY,
            stack_level: -1,
            number_phases: default_phases,
            end: None,
        }
    }

    fn is_set(&self) -> bool {
        self.limit.is_finite()
    }
}

/// A profile's active period at some instant, with its remaining extent.
struct ActivePeriod {
    period: ChargingSchedulePeriod,
    /// End of the period (`None` = open-ended).
    end: Option<DateTime<Utc>>,
}

fn floor_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    t - Duration::nanoseconds(t.timestamp_subsec_nanos() as i64)
}

fn min_bound(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Anchor time the profile's period offsets count from, as of `time`.
fn profile_start_time(
    transactions: &dyn TransactionRegistry,
    time: DateTime<Utc>,
    profile: &ChargingProfile,
    connector_id: u32,
) -> Option<DateTime<Utc>> {
    match profile.charging_profile_kind {
        ChargingProfileKind::Absolute => profile
            .charging_schedule
            .start_schedule
            .map(floor_to_second),
        ChargingProfileKind::Relative => transactions
            .active_transaction(connector_id)
            .map(|transaction| floor_to_second(transaction.started_at)),
        ChargingProfileKind::Recurring => {
            let start = floor_to_second(profile.charging_schedule.start_schedule?);
            let recurrency = profile.recurrency_kind?;
            let time = floor_to_second(time);
            let elapsed = (time - start).num_seconds();
            if elapsed <= 0 {
                // first occurrence has not begun yet
                Some(start)
            } else {
                Some(time - Duration::seconds(elapsed % recurrency.period_seconds()))
            }
        }
    }
}

/// The profile's active period at `time`, if any.
fn find_period_at(
    transactions: &dyn TransactionRegistry,
    time: DateTime<Utc>,
    profile: &ChargingProfile,
    connector_id: u32,
) -> Option<ActivePeriod> {
    let anchor = profile_start_time(transactions, time, profile, connector_id)?;
    let schedule = &profile.charging_schedule;
    for (index, period) in schedule.charging_schedule_period.iter().enumerate() {
        let period_start = anchor + Duration::seconds(period.start_period);
        let end = period_end_time(schedule, index, period_start);
        if period_start <= time && end.map_or(true, |end| time < end) {
            return Some(ActivePeriod {
                period: period.clone(),
                end,
            });
        }
    }
    None
}

/// Earliest schedule boundary strictly after `current` across all profiles.
///
/// Besides period starts and ends this also visits validity-window edges and
/// the next recurrence wrap; extra visits are harmless because a period is
/// only emitted when the resolved limit actually changes. `None` means
/// nothing constrains the window further and the sweep can stop.
fn next_schedule_boundary(
    transactions: &dyn TransactionRegistry,
    current: DateTime<Utc>,
    profiles: &[ChargingProfile],
    connector_id: u32,
) -> Option<DateTime<Utc>> {
    let mut next: Option<DateTime<Utc>> = None;
    let mut consider = |candidate: DateTime<Utc>| {
        if candidate > current && next.map_or(true, |n| candidate < n) {
            next = Some(candidate);
        }
    };
    for profile in profiles {
        if let Some(from) = profile.valid_from {
            consider(from);
        }
        if let Some(to) = profile.valid_to {
            consider(to);
        }
        let Some(anchor) = profile_start_time(transactions, current, profile, connector_id)
        else {
            continue;
        };
        let schedule = &profile.charging_schedule;
        for (index, period) in schedule.charging_schedule_period.iter().enumerate() {
            let period_start = anchor + Duration::seconds(period.start_period);
            consider(period_start);
            if let Some(end) = period_end_time(schedule, index, period_start) {
                consider(end);
            }
        }
        if profile.charging_profile_kind == ChargingProfileKind::Recurring {
            if let Some(recurrency) = profile.recurrency_kind {
                consider(anchor + Duration::seconds(recurrency.period_seconds()));
            }
        }
    }
    next
}

/// Resolve a snapshot of applicable profiles into the composite schedule for
/// `[start_time, end_time)`. Pure function of its inputs, apart from the
/// relative-profile anchors read from the transaction registry.
pub(super) fn calculate_composite_schedule(
    config: &SmartChargingConfig,
    transactions: &dyn TransactionRegistry,
    valid_profiles: &[ChargingProfile],
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    connector_id: u32,
    rate_unit: ChargingRateUnit,
) -> EnhancedChargingSchedule {
    let mut periods: Vec<EnhancedChargingSchedulePeriod> = Vec::new();
    let mut current = start_time;
    let mut current_limit = f64::INFINITY;
    let mut last_period_end: Option<DateTime<Utc>> = None;

    while current < end_time {
        let mut charge_point_max = LimitStackLevelPair::unset(config.default_number_of_phases);
        let mut tx_default = LimitStackLevelPair::unset(config.default_number_of_phases);
        let mut tx = LimitStackLevelPair::unset(config.default_number_of_phases);

        for profile in valid_profiles {
            if !profile.is_valid_at(current) {
                continue;
            }
            let entry = match profile.charging_profile_purpose {
                ChargingProfilePurpose::ChargePointMaxProfile => &mut charge_point_max,
                ChargingProfilePurpose::TxDefaultProfile => &mut tx_default,
                ChargingProfilePurpose::TxProfile => &mut tx,
            };
            // a lower-stacked profile cannot override one that already
            // produced a limit at this instant
            if (profile.stack_level as i64) <= entry.stack_level {
                continue;
            }
            if let Some(active) = find_period_at(transactions, current, profile, connector_id) {
                let number_phases = active
                    .period
                    .number_phases
                    .unwrap_or(config.default_number_of_phases);
                entry.limit = to_power_watts(
                    active.period.limit,
                    number_phases,
                    profile.charging_schedule.charging_rate_unit,
                    config.low_voltage,
                );
                entry.stack_level = profile.stack_level as i64;
                entry.number_phases = number_phases;
                entry.end = min_bound(active.end, profile.valid_to);
            }
        }

        // TxProfile beats TxDefaultProfile whenever it produced a limit; the
        // charge-point ceiling then overrides both when it is lower.
        let transaction_pair = if tx.is_set() { tx } else { tx_default };
        let winner = if charge_point_max.is_set() && charge_point_max.limit < transaction_pair.limit
        {
            charge_point_max
        } else {
            transaction_pair
        };

        if winner.is_set() && winner.limit != current_limit {
            periods.push(EnhancedChargingSchedulePeriod {
                start_period: (current - start_time).num_seconds(),
                limit: from_power_watts(
                    winner.limit,
                    winner.number_phases,
                    rate_unit,
                    config.low_voltage,
                ),
                number_phases: winner.number_phases,
                stack_level: winner.stack_level as u32,
            });
            current_limit = winner.limit;
            last_period_end = winner.end;
        }

        match next_schedule_boundary(transactions, current, valid_profiles, connector_id) {
            // the boundary walk only yields instants strictly ahead of
            // `current`, so every iteration makes progress
            Some(next) if next > current => current = next,
            _ => break,
        }
    }

    let window = (end_time - start_time).num_seconds();
    let duration = match last_period_end {
        // nothing constrains the tail; report the shorter extent
        Some(end) if end < end_time => (end - start_time).num_seconds(),
        _ => window,
    };

    EnhancedChargingSchedule {
        charging_rate_unit: rate_unit,
        start_schedule: start_time,
        duration,
        charging_schedule_period: periods,
    }
}

// ── Tests ──────────────────────────────────────────────────────
