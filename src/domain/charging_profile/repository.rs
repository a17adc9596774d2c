//! ChargingProfile repository interface

use async_trait::async_trait;

use super::model::ChargingProfile;
use crate::domain::error::DomainResult;

/// Persistence collaborator for installed profiles.
///
/// Failures are reported as values; the engine logs them and continues, so
/// the in-memory view stays authoritative for the running process.
#[async_trait]
pub trait ChargingProfileRepository: Send + Sync {
    /// Insert or overwrite the stored record for a profile on a connector
    /// scope (0 = the charge point itself).
    async fn insert_or_update(
        &self,
        connector_id: u32,
        profile: &ChargingProfile,
    ) -> DomainResult<()>;

    /// Delete the stored record with the given profile ID.
    async fn delete(&self, profile_id: i32) -> DomainResult<()>;

    /// Delete every stored profile record.
    async fn delete_all(&self) -> DomainResult<()>;
}
