//! Profile admission validation
//!
//! Gate applied before a profile enters the store. Returns the profile to
//! install — possibly amended (substituted start schedule, clamped recurring
//! duration); every other rule violation rejects with a reason.

use chrono::Utc;

use crate::config::SmartChargingConfig;
use crate::domain::{
    ChargingProfile, ChargingProfileKind, ChargingProfilePurpose, DomainError, DomainResult,
    TransactionRegistry,
};

use super::store::ProfileStore;

pub(super) fn validate_profile(
    config: &SmartChargingConfig,
    store: &ProfileStore,
    transactions: &dyn TransactionRegistry,
    mut profile: ChargingProfile,
    connector_id: u32,
    ignore_no_active_transaction: bool,
) -> DomainResult<ChargingProfile> {
    if connector_id > transactions.connector_count() {
        return Err(DomainError::ConnectorOutOfRange(connector_id));
    }
    if profile.stack_level > config.max_stack_level {
        return Err(DomainError::Validation(format!(
            "stack level {} exceeds maximum {}",
            profile.stack_level, config.max_stack_level
        )));
    }

    // Absolute and Recurring schedules need a wall-clock anchor.
    if matches!(
        profile.charging_profile_kind,
        ChargingProfileKind::Absolute | ChargingProfileKind::Recurring
    ) && profile.charging_schedule.start_schedule.is_none()
    {
        if config.allow_profile_without_start_schedule {
            profile.charging_schedule.start_schedule = Some(Utc::now());
        } else {
            return Err(DomainError::Validation(
                "Absolute/Recurring profile without start schedule".to_string(),
            ));
        }
    }

    if store.count_all() >= config.max_profiles_installed {
        return Err(DomainError::Validation(format!(
            "maximum of {} installed profiles reached",
            config.max_profiles_installed
        )));
    }

    validate_schedule(config, &profile)?;

    if profile.charging_profile_kind == ChargingProfileKind::Recurring {
        let Some(recurrency) = profile.recurrency_kind else {
            return Err(DomainError::Validation(
                "Recurring profile without recurrency kind".to_string(),
            ));
        };
        // an over-long duration is clamped to one recurrence, not rejected
        let max_duration = recurrency.period_seconds();
        if profile
            .charging_schedule
            .duration
            .is_some_and(|duration| duration > max_duration)
        {
            profile.charging_schedule.duration = Some(max_duration);
        }
    }

    match profile.charging_profile_purpose {
        ChargingProfilePurpose::ChargePointMaxProfile => {
            if connector_id != 0 {
                return Err(DomainError::Validation(
                    "ChargePointMaxProfile is only allowed on connector 0".to_string(),
                ));
            }
            if profile.charging_profile_kind == ChargingProfileKind::Relative {
                return Err(DomainError::Validation(
                    "ChargePointMaxProfile cannot be Relative".to_string(),
                ));
            }
        }
        ChargingProfilePurpose::TxDefaultProfile => {}
        ChargingProfilePurpose::TxProfile => {
            if connector_id == 0 {
                return Err(DomainError::Validation(
                    "TxProfile requires a specific connector".to_string(),
                ));
            }
            match transactions.active_transaction(connector_id) {
                Some(transaction) => {
                    if profile
                        .transaction_id
                        .is_some_and(|id| id != transaction.id)
                    {
                        return Err(DomainError::Validation(format!(
                            "transaction id {} does not match the active transaction {}",
                            profile.transaction_id.unwrap_or_default(),
                            transaction.id
                        )));
                    }
                }
                None if ignore_no_active_transaction => {}
                None => {
                    return Err(DomainError::Validation(format!(
                        "no active transaction on connector {}",
                        connector_id
                    )));
                }
            }
        }
    }

    Ok(profile)
}

fn validate_schedule(config: &SmartChargingConfig, profile: &ChargingProfile) -> DomainResult<()> {
    let schedule = &profile.charging_schedule;
    if schedule.charging_schedule_period.is_empty() {
        return Err(DomainError::Validation(
            "charging schedule has no periods".to_string(),
        ));
    }
    if schedule.charging_schedule_period.len() > config.max_schedule_periods {
        return Err(DomainError::Validation(format!(
            "charging schedule has {} periods, maximum is {}",
            schedule.charging_schedule_period.len(),
            config.max_schedule_periods
        )));
    }
    if !config.allowed_rate_units.contains(&schedule.charging_rate_unit) {
        return Err(DomainError::Validation(format!(
            "charging rate unit {:?} is not allowed",
            schedule.charging_rate_unit
        )));
    }
    if schedule.min_charging_rate.is_some_and(|rate| rate < 0.0) {
        return Err(DomainError::Validation(
            "negative minimum charging rate".to_string(),
        ));
    }

    let mut previous_start: Option<i64> = None;
    for period in &schedule.charging_schedule_period {
        if period.start_period < 0 {
            return Err(DomainError::Validation(
                "negative period start offset".to_string(),
            ));
        }
        if previous_start.is_some_and(|previous| period.start_period <= previous) {
            return Err(DomainError::Validation(
                "period start offsets must be strictly increasing".to_string(),
            ));
        }
        previous_start = Some(period.start_period);
        if period.limit < 0.0 {
            return Err(DomainError::Validation("negative period limit".to_string()));
        }
        if period
            .number_phases
            .is_some_and(|phases| phases < 1 || phases > config.max_number_of_phases)
        {
            return Err(DomainError::Validation(format!(
                "period phase count must be within [1, {}]",
                config.max_number_of_phases
            )));
        }
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────
