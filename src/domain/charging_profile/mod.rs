pub mod model;
pub mod repository;

pub use model::{
    ChargingProfile, ChargingProfileKind, ChargingProfilePurpose, ChargingRateUnit,
    ChargingSchedule, ChargingSchedulePeriod, RecurrencyKind,
};
pub use repository::ChargingProfileRepository;
