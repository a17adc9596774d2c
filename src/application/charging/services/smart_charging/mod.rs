//! Smart charging profile engine
//!
//! Ingests possibly overlapping charging-limit profiles, keeps the
//! per-purpose stacks, and resolves them into a single composite schedule.
//!
//! ## Architecture
//!
//! ```text
//! add_profile ──► validator ──► ProfileStore ──► write-through persistence
//!                                    │
//! composite_schedule ──► snapshot valid profiles ──► sweep calculator
//! ```
//!
//! The calculator works on a cloned snapshot taken under the store's locks,
//! so schedule computation never blocks concurrent profile mutation.

mod composite;
mod schedule;
mod store;
mod validator;

pub use composite::{EnhancedChargingSchedule, EnhancedChargingSchedulePeriod};

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::SmartChargingConfig;
use crate::domain::{
    ChargingProfile, ChargingProfilePurpose, ChargingProfileRepository, ChargingRateUnit,
    ChargingSchedule, DomainError, DomainResult, TransactionRegistry,
};

use store::ProfileStore;

/// Filter for [`SmartChargingService::clear_profiles`]; unset fields match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct ClearProfilesCriteria {
    pub profile_id: Option<i32>,
    pub connector_id: Option<u32>,
    pub stack_level: Option<u32>,
    pub purpose: Option<ChargingProfilePurpose>,
    /// Match on `profile_id` alone, ignoring the other fields.
    pub check_id_only: bool,
}

impl ClearProfilesCriteria {
    fn matches(&self, connector_id: u32, profile: &ChargingProfile) -> bool {
        if self.check_id_only {
            return self
                .profile_id
                .map_or(false, |id| id == profile.charging_profile_id);
        }
        self.profile_id
            .map_or(true, |id| id == profile.charging_profile_id)
            && self.connector_id.map_or(true, |c| c == connector_id)
            && self.stack_level.map_or(true, |l| l == profile.stack_level)
            && self
                .purpose
                .map_or(true, |p| p == profile.charging_profile_purpose)
    }
}

/// Service resolving charging-limit profiles for a charge point.
pub struct SmartChargingService {
    config: SmartChargingConfig,
    store: ProfileStore,
    repository: Arc<dyn ChargingProfileRepository>,
    transactions: Arc<dyn TransactionRegistry>,
}

impl SmartChargingService {
    pub fn new(
        config: SmartChargingConfig,
        repository: Arc<dyn ChargingProfileRepository>,
        transactions: Arc<dyn TransactionRegistry>,
    ) -> Self {
        let store = ProfileStore::new(transactions.connector_count());
        Self {
            config,
            store,
            repository,
            transactions,
        }
    }

    /// Validate and install a profile, replacing any occupant of its
    /// (scope, stack level) slot.
    ///
    /// `ignore_no_active_transaction` admits a TxProfile even though its
    /// connector has no running transaction.
    pub async fn add_profile(
        &self,
        profile: ChargingProfile,
        connector_id: u32,
        ignore_no_active_transaction: bool,
    ) -> DomainResult<()> {
        let profile = match validator::validate_profile(
            &self.config,
            &self.store,
            self.transactions.as_ref(),
            profile,
            connector_id,
            ignore_no_active_transaction,
        ) {
            Ok(profile) => profile,
            Err(error) => {
                warn!(connector_id, error = %error, "Charging profile rejected");
                return Err(error);
            }
        };

        let profile_id = profile.charging_profile_id;
        let purpose = profile.charging_profile_purpose;
        // (connector scope, profile) pairs to persist once the locks are
        // released again
        let mut installed: Vec<(u32, ChargingProfile)> = Vec::new();
        match purpose {
            ChargingProfilePurpose::ChargePointMaxProfile => {
                self.store.upsert_charge_point_max(profile.clone());
                installed.push((0, profile));
            }
            ChargingProfilePurpose::TxDefaultProfile => {
                if connector_id == 0 {
                    // station-wide default: fan out to every connector
                    for connector in self.store.connector_ids() {
                        self.store.upsert_tx_default(connector, profile.clone());
                        installed.push((connector, profile.clone()));
                    }
                } else {
                    self.store.upsert_tx_default(connector_id, profile.clone());
                    installed.push((connector_id, profile));
                }
            }
            ChargingProfilePurpose::TxProfile => {
                self.store.upsert_tx(connector_id, profile.clone());
                installed.push((connector_id, profile));
            }
        }

        for (scope, profile) in &installed {
            // the in-memory view stays authoritative when the write-through
            // fails
            if let Err(error) = self.repository.insert_or_update(*scope, profile).await {
                warn!(
                    profile_id,
                    connector_id = *scope,
                    error = %error,
                    "Failed to persist charging profile"
                );
            }
        }

        info!(
            profile_id,
            connector_id,
            purpose = purpose.as_str(),
            "Charging profile installed"
        );
        Ok(())
    }

    /// Remove every installed profile matching the criteria. Returns whether
    /// at least one profile was removed.
    pub async fn clear_profiles(&self, criteria: &ClearProfilesCriteria) -> bool {
        let removed = self.store.clear_matching(criteria);
        for profile_id in &removed {
            if let Err(error) = self.repository.delete(*profile_id).await {
                warn!(
                    profile_id = *profile_id,
                    error = %error,
                    "Failed to delete persisted charging profile"
                );
            }
        }
        if removed.is_empty() {
            debug!(?criteria, "No charging profiles matched clear criteria");
            false
        } else {
            info!(count = removed.len(), "Charging profiles cleared");
            true
        }
    }

    /// Drop every installed profile.
    pub async fn clear_all_profiles(&self) {
        self.store.clear_all();
        if let Err(error) = self.repository.delete_all().await {
            warn!(error = %error, "Failed to delete persisted charging profiles");
        }
        info!("All charging profiles cleared");
    }

    /// Remove profiles whose validity window has passed. Invoked by the
    /// periodic expiry task; returns how many profiles were removed.
    pub async fn expire_profiles(&self, now: DateTime<Utc>) -> usize {
        let removed = self
            .store
            .remove_expired(now, self.config.expire_all_purposes);
        for profile_id in &removed {
            if let Err(error) = self.repository.delete(*profile_id).await {
                warn!(
                    profile_id = *profile_id,
                    error = %error,
                    "Failed to delete persisted charging profile"
                );
            }
        }
        if !removed.is_empty() {
            info!(count = removed.len(), "Expired charging profiles removed");
        }
        removed.len()
    }

    /// Number of profiles currently installed across all scopes.
    pub fn installed_count(&self) -> usize {
        self.store.count_all()
    }

    /// Snapshot of the profiles applicable to `connector_id` within the
    /// window: every overlapping charge-point-max profile, plus the
    /// connector's tx and tx-default profiles while it has an active
    /// transaction.
    pub fn valid_profiles(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        connector_id: u32,
    ) -> DomainResult<Vec<ChargingProfile>> {
        if connector_id > self.transactions.connector_count() {
            return Err(DomainError::ConnectorOutOfRange(connector_id));
        }
        let overlapping =
            |profile: &ChargingProfile| schedule::validity_overlaps(profile, start_time, end_time);

        let mut profiles: Vec<ChargingProfile> = self
            .store
            .charge_point_max_profiles()
            .into_iter()
            .filter(overlapping)
            .collect();
        if self.transactions.active_transaction(connector_id).is_some() {
            profiles.extend(
                self.store
                    .tx_default_profiles(connector_id)
                    .into_iter()
                    .filter(overlapping),
            );
            profiles.extend(
                self.store
                    .tx_profiles(connector_id)
                    .into_iter()
                    .filter(overlapping),
            );
        }
        Ok(profiles)
    }

    /// Resolve a snapshot of profiles into the composite schedule for the
    /// window. Pure function of its inputs, so equal snapshots yield equal
    /// schedules.
    pub fn calculate_composite_schedule(
        &self,
        valid_profiles: &[ChargingProfile],
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        connector_id: u32,
        rate_unit: ChargingRateUnit,
    ) -> EnhancedChargingSchedule {
        composite::calculate_composite_schedule(
            &self.config,
            self.transactions.as_ref(),
            valid_profiles,
            start_time,
            end_time,
            connector_id,
            rate_unit,
        )
    }

    /// Composite schedule for the next `duration_secs` seconds, in the
    /// external form (stack levels dropped).
    pub fn composite_schedule(
        &self,
        connector_id: u32,
        duration_secs: i64,
        rate_unit: ChargingRateUnit,
    ) -> DomainResult<ChargingSchedule> {
        let start_time = Utc::now();
        let end_time = start_time + Duration::seconds(duration_secs);
        let profiles = self.valid_profiles(start_time, end_time, connector_id)?;
        Ok(self
            .calculate_composite_schedule(&profiles, start_time, end_time, connector_id, rate_unit)
            .into_charging_schedule())
    }
}

// ── Tests ──────────────────────────────────────────────────────
