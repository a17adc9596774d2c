//! In-memory collaborator implementations for development and testing

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::{
    ChargingProfile, ChargingProfileRepository, DomainResult, Transaction, TransactionRegistry,
};

/// In-memory profile persistence, keyed by profile ID.
pub struct InMemoryProfileStorage {
    profiles: DashMap<i32, (u32, ChargingProfile)>,
}

impl InMemoryProfileStorage {
    pub fn new() -> Self {
        Self {
            profiles: DashMap::new(),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for InMemoryProfileStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChargingProfileRepository for InMemoryProfileStorage {
    async fn insert_or_update(
        &self,
        connector_id: u32,
        profile: &ChargingProfile,
    ) -> DomainResult<()> {
        // A profile replacing the occupant of a (connector, purpose, stack
        // level) slot supersedes the old record even when the IDs differ.
        self.profiles.retain(|_, (cid, p)| {
            !(*cid == connector_id
                && p.charging_profile_purpose == profile.charging_profile_purpose
                && p.stack_level == profile.stack_level)
        });
        self.profiles
            .insert(profile.charging_profile_id, (connector_id, profile.clone()));
        Ok(())
    }

    async fn delete(&self, profile_id: i32) -> DomainResult<()> {
        self.profiles.remove(&profile_id);
        Ok(())
    }

    async fn delete_all(&self) -> DomainResult<()> {
        self.profiles.clear();
        Ok(())
    }
}

/// Live per-connector transaction state.
pub struct ConnectorRegistry {
    connector_count: u32,
    active: DashMap<u32, Transaction>,
    transaction_counter: AtomicI32,
}

impl ConnectorRegistry {
    pub fn new(connector_count: u32) -> Self {
        Self {
            connector_count,
            active: DashMap::new(),
            transaction_counter: AtomicI32::new(1),
        }
    }

    /// Record a transaction start on a connector.
    pub fn start_transaction(
        &self,
        connector_id: u32,
        id_tag: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Transaction {
        let id = self.transaction_counter.fetch_add(1, Ordering::SeqCst);
        let transaction = Transaction::new(id, connector_id, id_tag, started_at);
        self.active.insert(connector_id, transaction.clone());
        transaction
    }

    /// Drop the active transaction on a connector.
    pub fn stop_transaction(&self, connector_id: u32) {
        self.active.remove(&connector_id);
    }
}

impl TransactionRegistry for ConnectorRegistry {
    fn connector_count(&self) -> u32 {
        self.connector_count
    }

    fn active_transaction(&self, connector_id: u32) -> Option<Transaction> {
        self.active.get(&connector_id).map(|t| t.clone())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::{
        ChargingProfileKind, ChargingProfilePurpose, ChargingRateUnit, ChargingSchedule,
        ChargingSchedulePeriod,
    };

    fn profile(id: i32, stack_level: u32) -> ChargingProfile {
        ChargingProfile {
            charging_profile_id: id,
            transaction_id: None,
            stack_level,
            charging_profile_purpose: ChargingProfilePurpose::TxDefaultProfile,
            charging_profile_kind: ChargingProfileKind::Absolute,
            recurrency_kind: None,
            valid_from: None,
            valid_to: None,
            charging_schedule: ChargingSchedule {
                charging_rate_unit: ChargingRateUnit::Amps,
                start_schedule: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
                duration: None,
                min_charging_rate: None,
                charging_schedule_period: vec![ChargingSchedulePeriod {
                    start_period: 0,
                    limit: 16.0,
                    number_phases: None,
                }],
            },
        }
    }

    #[tokio::test]
    async fn insert_supersedes_same_slot() {
        let storage = InMemoryProfileStorage::new();
        storage.insert_or_update(1, &profile(1, 0)).await.unwrap();
        // different ID, same (connector, purpose, stack level) slot
        storage.insert_or_update(1, &profile(2, 0)).await.unwrap();
        assert_eq!(storage.len(), 1);
        // same slot on another connector is independent
        storage.insert_or_update(2, &profile(3, 0)).await.unwrap();
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn delete_and_delete_all() {
        let storage = InMemoryProfileStorage::new();
        storage.insert_or_update(1, &profile(1, 0)).await.unwrap();
        storage.insert_or_update(1, &profile(2, 1)).await.unwrap();
        storage.delete(1).await.unwrap();
        assert_eq!(storage.len(), 1);
        storage.delete_all().await.unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn registry_tracks_active_transactions() {
        let registry = ConnectorRegistry::new(2);
        assert!(registry.active_transaction(1).is_none());

        let started = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let transaction = registry.start_transaction(1, "TAG-001", started);
        assert_eq!(transaction.connector_id, 1);

        let found = registry.active_transaction(1).unwrap();
        assert_eq!(found.id, transaction.id);
        assert_eq!(found.started_at, started);
        assert!(registry.active_transaction(2).is_none());

        registry.stop_transaction(1);
        assert!(registry.active_transaction(1).is_none());
    }
}
