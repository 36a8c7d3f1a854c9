//! Charging infrastructure and the generation side of the power balance.

pub mod power_balance;
/// Charging stations and the reserve/occupy/release protocol.
pub mod station;

pub use power_balance::{PowerBalance, PowerBalanceModel, PowerPlant, SolarPanel};
pub use station::{
    ChargeReport, ChargingStation, ChargingStationPool, StationError, StationId, StationPhase,
};
