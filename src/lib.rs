//! # Smart Charging Profile Engine
//!
//! Resolves multiple, possibly overlapping charging-limit profiles for an EV
//! supply point into a single composite power/current schedule the charging
//! hardware must obey.
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, types and traits
//! - **application**: Business logic (profile lifecycle, admission control,
//!   composite schedule calculation)
//! - **infrastructure**: External concerns (in-memory persistence, connector
//!   transaction registry)
//! - **support**: Cross-cutting helpers (graceful shutdown)

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod support;

pub use config::SmartChargingConfig;

// Re-export the engine surface for easy access
pub use application::charging::services::profile_expiry::start_profile_expiry_task;
pub use application::charging::services::smart_charging::{
    ClearProfilesCriteria, EnhancedChargingSchedule, EnhancedChargingSchedulePeriod,
    SmartChargingService,
};
pub use domain::{
    ChargingProfile, ChargingProfileKind, ChargingProfilePurpose, ChargingProfileRepository,
    ChargingRateUnit, ChargingSchedule, ChargingSchedulePeriod, DomainError, DomainResult,
    RecurrencyKind, Transaction, TransactionRegistry,
};
pub use infrastructure::storage::{ConnectorRegistry, InMemoryProfileStorage};
pub use support::shutdown::ShutdownSignal;
