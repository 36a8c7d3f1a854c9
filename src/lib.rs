//! Electric fleet mobility and charging-coordination simulator.
//!
//! Vehicles roam a road network, drain their batteries per completed road
//! segment, reserve and occupy charging stations when low, and feed a
//! supply/demand balance of solar panels and a dispatchable plant.
//! [`sim::Simulation`] drives everything one logical tick at a time.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// Distance-to-energy conversion.
pub mod energy;
pub mod error;
pub mod fleet;
pub mod geo;
pub mod grid;
pub mod network;
/// Tick engine, snapshots and KPIs.
pub mod sim;

pub use error::SimError;
