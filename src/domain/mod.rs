pub mod charging_profile;
pub mod error;
pub mod transaction;

// Re-export commonly used types
pub use charging_profile::{
    ChargingProfile, ChargingProfileKind, ChargingProfilePurpose, ChargingProfileRepository,
    ChargingRateUnit, ChargingSchedule, ChargingSchedulePeriod, RecurrencyKind,
};
pub use error::{DomainError, DomainResult};
pub use transaction::{Transaction, TransactionRegistry};
