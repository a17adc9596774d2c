//! Background task that periodically removes expired charging profiles.
//!
//! Runs in a tokio::spawn loop on a daily cadence, dropping installed
//! profiles whose `valid_to` has passed.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Duration;
use tracing::info;

use crate::support::shutdown::ShutdownSignal;

use super::smart_charging::SmartChargingService;

/// Default sweep cadence: once per day.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 86_400;

/// Start the profile expiry background task.
///
/// The task sweeps the installed profiles every `check_interval_secs`
/// (default one day) and removes the ones whose validity window has passed.
pub fn start_profile_expiry_task(
    service: Arc<SmartChargingService>,
    shutdown: ShutdownSignal,
    check_interval_secs: u64,
) {
    tokio::spawn(async move {
        info!(
            check_interval = check_interval_secs,
            "🧹 Profile expiry task started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    service.expire_profiles(Utc::now()).await;
                }
                _ = shutdown.notified().wait() => {
                    info!("🧹 Profile expiry task shutting down");
                    break;
                }
            }
        }

        info!("🧹 Profile expiry task stopped");
    });
}
