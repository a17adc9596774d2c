//! Business logic services

pub mod profile_expiry;
pub mod smart_charging;

pub use profile_expiry::start_profile_expiry_task;
pub use smart_charging::SmartChargingService;
