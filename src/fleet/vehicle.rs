use std::fmt;

use serde::Serialize;

use super::route::RouteTracker;
use crate::geo::GeoPoint;
use crate::grid::StationId;

/// Stable vehicle identifier; doubles as the index into the fleet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VehicleId(pub u32);

impl VehicleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V_{}", self.0)
    }
}

/// Per-tick mobility state of a vehicle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleState {
    /// No route, or route exhausted and waiting for a new one.
    Idle,
    /// Planning a charging trip within the current tick.
    Routing,
    /// Following a route.
    Moving,
    /// Parked at a station and drawing power.
    Charging,
    /// Out of energy for the next hop. Terminal.
    Stranded,
}

impl VehicleState {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleState::Idle => "idle",
            VehicleState::Routing => "routing",
            VehicleState::Moving => "moving",
            VehicleState::Charging => "charging",
            VehicleState::Stranded => "stranded",
        }
    }
}

/// Where a vehicle is headed, resolved against the station pool by id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Destination {
    #[default]
    None,
    ChargingStation(StationId),
}

impl Destination {
    pub fn station(self) -> Option<StationId> {
        match self {
            Destination::None => None,
            Destination::ChargingStation(id) => Some(id),
        }
    }
}

/// An electric vehicle with an onboard energy reserve.
///
/// `reserve_kwh` is kept in `[0, capacity_kwh]` by every mutator.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub position: GeoPoint,
    pub route: RouteTracker,
    pub state: VehicleState,
    pub destination: Destination,
    capacity_kwh: f64,
    reserve_kwh: f64,
}

impl Vehicle {
    /// Creates an idle vehicle with no route.
    ///
    /// `reserve_kwh` is clamped to `[0, capacity_kwh]`.
    pub fn new(id: VehicleId, position: GeoPoint, capacity_kwh: f64, reserve_kwh: f64) -> Self {
        let capacity_kwh = capacity_kwh.max(0.0);
        Self {
            id,
            position,
            route: RouteTracker::new(),
            state: VehicleState::Idle,
            destination: Destination::None,
            capacity_kwh,
            reserve_kwh: reserve_kwh.clamp(0.0, capacity_kwh),
        }
    }

    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    pub fn reserve_kwh(&self) -> f64 {
        self.reserve_kwh
    }

    /// Fraction of capacity currently stored.
    pub fn state_of_charge(&self) -> f64 {
        if self.capacity_kwh > 0.0 {
            self.reserve_kwh / self.capacity_kwh
        } else {
            0.0
        }
    }

    /// Energy that could still be added before the pack is full.
    pub fn headroom_kwh(&self) -> f64 {
        self.capacity_kwh - self.reserve_kwh
    }

    pub fn is_below(&self, fraction: f64) -> bool {
        self.reserve_kwh < fraction * self.capacity_kwh
    }

    /// Removes energy, flooring the reserve at zero.
    pub fn draw(&mut self, kwh: f64) {
        self.reserve_kwh = (self.reserve_kwh - kwh.max(0.0)).max(0.0);
    }

    /// Adds up to `kwh`, capped at capacity. Returns the energy actually added.
    pub fn charge(&mut self, kwh: f64) -> f64 {
        let delta = kwh.max(0.0).min(self.headroom_kwh());
        self.reserve_kwh += delta;
        delta
    }

    pub fn is_stranded(&self) -> bool {
        self.state == VehicleState::Stranded
    }
}
