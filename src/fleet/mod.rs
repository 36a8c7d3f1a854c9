//! Vehicles, their routes, and the per-tick coordinator that moves them.

/// Per-tick routing, movement and charging hand-off.
pub mod coordinator;
/// Route cursor and interpolation.
pub mod route;
pub mod vehicle;

pub use coordinator::{AdvanceReport, CoordinatorParams, VehicleCoordinator};
pub use route::{Advance, RouteTracker};
pub use vehicle::{Destination, Vehicle, VehicleId, VehicleState};
