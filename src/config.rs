//! Smart charging configuration

use serde::Deserialize;

use crate::domain::ChargingRateUnit;

/// Recognized smart charging options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmartChargingConfig {
    /// Maximum number of periods a charging schedule may carry.
    pub max_schedule_periods: usize,
    /// Charging rate units accepted at admission.
    pub allowed_rate_units: Vec<ChargingRateUnit>,
    /// Highest stack level a profile may use.
    pub max_stack_level: u32,
    /// Maximum number of profiles installed across all scopes.
    pub max_profiles_installed: usize,
    /// Substitute "now" for a missing start schedule on Absolute/Recurring
    /// profiles instead of rejecting them.
    pub allow_profile_without_start_schedule: bool,
    /// Phase count assumed when a period does not specify one.
    pub default_number_of_phases: u32,
    /// Highest phase count a period may specify.
    pub max_number_of_phases: u32,
    /// Nominal line voltage used for current <-> power conversion.
    pub low_voltage: f64,
    /// Whether the daily expiry sweep covers every purpose. `false` restores
    /// the legacy behavior of sweeping only charge-point-max profiles.
    pub expire_all_purposes: bool,
}

impl Default for SmartChargingConfig {
    fn default() -> Self {
        Self {
            max_schedule_periods: 100,
            allowed_rate_units: vec![ChargingRateUnit::Amps, ChargingRateUnit::Watts],
            max_stack_level: 10,
            max_profiles_installed: 20,
            allow_profile_without_start_schedule: false,
            default_number_of_phases: 3,
            max_number_of_phases: 3,
            low_voltage: 230.0,
            expire_all_purposes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = SmartChargingConfig::default();
        assert_eq!(config.default_number_of_phases, 3);
        assert_eq!(config.low_voltage, 230.0);
        assert!(config.allowed_rate_units.contains(&ChargingRateUnit::Amps));
        assert!(config.allowed_rate_units.contains(&ChargingRateUnit::Watts));
        assert!(config.expire_all_purposes);
    }

    #[test]
    fn partial_deserialization_fills_defaults() {
        let config: SmartChargingConfig =
            serde_json::from_str(r#"{"maxStackLevel": 4, "allowedRateUnits": ["W"]}"#).unwrap();
        assert_eq!(config.max_stack_level, 4);
        assert_eq!(config.allowed_rate_units, vec![ChargingRateUnit::Watts]);
        // untouched fields keep their defaults
        assert_eq!(config.max_schedule_periods, 100);
        assert!(!config.allow_profile_without_start_schedule);
    }
}
