//! Installed-profile store
//!
//! Three independent stack-level maps: one station-wide charge-point-max
//! scope and two per-connector scopes (tx-default, tx). Each scope has its
//! own lock; operations spanning scopes take the locks in the fixed order
//! charge-point-max, tx-default, tx.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::domain::ChargingProfile;

use super::ClearProfilesCriteria;

type LevelMap = BTreeMap<u32, ChargingProfile>;
type ConnectorMap = BTreeMap<u32, LevelMap>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct ProfileStore {
    charge_point_max: Mutex<LevelMap>,
    tx_default: Mutex<ConnectorMap>,
    tx: Mutex<ConnectorMap>,
}

impl ProfileStore {
    pub fn new(connector_count: u32) -> Self {
        let connectors: ConnectorMap = (1..=connector_count)
            .map(|connector_id| (connector_id, LevelMap::new()))
            .collect();
        Self {
            charge_point_max: Mutex::new(LevelMap::new()),
            tx_default: Mutex::new(connectors.clone()),
            tx: Mutex::new(connectors),
        }
    }

    pub fn connector_ids(&self) -> Vec<u32> {
        lock(&self.tx_default).keys().copied().collect()
    }

    /// Install a charge-point-max profile, replacing the occupant of its
    /// stack level.
    pub fn upsert_charge_point_max(&self, profile: ChargingProfile) {
        lock(&self.charge_point_max).insert(profile.stack_level, profile);
    }

    /// Install a tx-default profile on a connector.
    pub fn upsert_tx_default(&self, connector_id: u32, profile: ChargingProfile) {
        lock(&self.tx_default)
            .entry(connector_id)
            .or_default()
            .insert(profile.stack_level, profile);
    }

    /// Install a tx profile on a connector.
    pub fn upsert_tx(&self, connector_id: u32, profile: ChargingProfile) {
        lock(&self.tx)
            .entry(connector_id)
            .or_default()
            .insert(profile.stack_level, profile);
    }

    /// Snapshot of the charge-point-max profiles, stack level ascending.
    pub fn charge_point_max_profiles(&self) -> Vec<ChargingProfile> {
        lock(&self.charge_point_max).values().cloned().collect()
    }

    /// Snapshot of a connector's tx-default profiles, stack level ascending.
    pub fn tx_default_profiles(&self, connector_id: u32) -> Vec<ChargingProfile> {
        lock(&self.tx_default)
            .get(&connector_id)
            .map(|levels| levels.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of a connector's tx profiles, stack level ascending.
    pub fn tx_profiles(&self, connector_id: u32) -> Vec<ChargingProfile> {
        lock(&self.tx)
            .get(&connector_id)
            .map(|levels| levels.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of installed profiles across all scopes.
    pub fn count_all(&self) -> usize {
        let charge_point_max = lock(&self.charge_point_max);
        let tx_default = lock(&self.tx_default);
        let tx = lock(&self.tx);
        charge_point_max.len()
            + tx_default.values().map(LevelMap::len).sum::<usize>()
            + tx.values().map(LevelMap::len).sum::<usize>()
    }

    /// Remove every profile matching the criteria. Returns the removed
    /// profile IDs.
    pub fn clear_matching(&self, criteria: &ClearProfilesCriteria) -> Vec<i32> {
        let mut removed = Vec::new();
        let mut charge_point_max = lock(&self.charge_point_max);
        let mut tx_default = lock(&self.tx_default);
        let mut tx = lock(&self.tx);

        charge_point_max.retain(|_, profile| {
            if criteria.matches(0, profile) {
                removed.push(profile.charging_profile_id);
                false
            } else {
                true
            }
        });
        for connectors in [&mut *tx_default, &mut *tx] {
            for (connector_id, levels) in connectors.iter_mut() {
                levels.retain(|_, profile| {
                    if criteria.matches(*connector_id, profile) {
                        removed.push(profile.charging_profile_id);
                        false
                    } else {
                        true
                    }
                });
            }
        }
        removed
    }

    /// Empty every scope.
    pub fn clear_all(&self) {
        let mut charge_point_max = lock(&self.charge_point_max);
        let mut tx_default = lock(&self.tx_default);
        let mut tx = lock(&self.tx);
        charge_point_max.clear();
        for levels in tx_default.values_mut() {
            levels.clear();
        }
        for levels in tx.values_mut() {
            levels.clear();
        }
    }

    /// Remove profiles whose `valid_to` has passed. With `all_purposes`
    /// unset only the charge-point-max scope is swept. Returns the removed
    /// profile IDs.
    pub fn remove_expired(&self, now: DateTime<Utc>, all_purposes: bool) -> Vec<i32> {
        let expired = |profile: &ChargingProfile| {
            profile.valid_to.is_some_and(|valid_to| valid_to < now)
        };
        let mut removed = Vec::new();
        let mut charge_point_max = lock(&self.charge_point_max);
        let mut tx_default = lock(&self.tx_default);
        let mut tx = lock(&self.tx);

        charge_point_max.retain(|_, profile| {
            if expired(profile) {
                removed.push(profile.charging_profile_id);
                false
            } else {
                true
            }
        });
        if all_purposes {
            for connectors in [&mut *tx_default, &mut *tx] {
                for levels in connectors.values_mut() {
                    levels.retain(|_, profile| {
                        if expired(profile) {
                            removed.push(profile.charging_profile_id);
                            false
                        } else {
                            true
                        }
                    });
                }
            }
        }
        removed
    }
}

// ── Tests ──────────────────────────────────────────────────────
