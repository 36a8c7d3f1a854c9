use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::fleet::{Destination, Vehicle, VehicleId, VehicleState};
use crate::geo::GeoPoint;

/// Stable station identifier; doubles as the index into the pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StationId(pub u32);

impl StationId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CS_{}", self.0)
    }
}

/// Who holds a station, if anyone.
///
/// Transitions: `Free → Reserved(v)` when `v` commits to the trip,
/// `Reserved(v) → Occupied(v)` when `v` arrives, `Occupied(v) → Free` when `v`
/// is charged enough, and `Reserved(v) → Free` if `v` can no longer get there.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", content = "vehicle", rename_all = "snake_case")]
pub enum StationPhase {
    #[default]
    Free,
    Reserved(VehicleId),
    Occupied(VehicleId),
}

/// Illegal station transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StationError {
    #[error("station {0} does not exist")]
    UnknownStation(StationId),

    #[error("station {station} is not available ({phase:?})")]
    NotAvailable {
        station: StationId,
        phase: StationPhase,
    },

    #[error("station {station} is not reserved by {vehicle} ({phase:?})")]
    NotReservedBy {
        station: StationId,
        vehicle: VehicleId,
        phase: StationPhase,
    },
}

/// A fixed charging point.
#[derive(Debug, Clone)]
pub struct ChargingStation {
    pub id: StationId,
    pub position: GeoPoint,
    /// Charging power in kW.
    pub capacity_kw: f64,
    phase: StationPhase,
}

impl ChargingStation {
    pub fn new(id: StationId, position: GeoPoint, capacity_kw: f64) -> Self {
        Self {
            id,
            position,
            capacity_kw,
            phase: StationPhase::Free,
        }
    }

    pub fn phase(&self) -> StationPhase {
        self.phase
    }

    /// `true` only when neither reserved nor occupied.
    pub fn available(&self) -> bool {
        self.phase == StationPhase::Free
    }

    /// Vehicle physically present and drawing power.
    pub fn occupant(&self) -> Option<VehicleId> {
        match self.phase {
            StationPhase::Occupied(v) => Some(v),
            _ => None,
        }
    }

    /// Vehicle holding either phase.
    pub fn holder(&self) -> Option<VehicleId> {
        match self.phase {
            StationPhase::Free => None,
            StationPhase::Reserved(v) | StationPhase::Occupied(v) => Some(v),
        }
    }
}

/// Outcome of one charging tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChargeReport {
    /// Energy added across all occupied stations (kWh).
    pub delivered_kwh: f64,
    /// Vehicles released this tick.
    pub completed: Vec<VehicleId>,
}

/// The fixed set of charging stations and their reservation protocol.
#[derive(Debug, Clone)]
pub struct ChargingStationPool {
    stations: Vec<ChargingStation>,
    /// Fraction of station capacity delivered per tick (kWh per kW).
    charge_rate_per_tick: f64,
    /// State of charge at which a vehicle is released.
    release_fraction: f64,
}

impl ChargingStationPool {
    /// Creates a pool.
    ///
    /// # Arguments
    ///
    /// * `stations` - Stations, indexed by id (`stations[i].id == StationId(i)`)
    /// * `charge_rate_per_tick` - Energy per tick per kW of station capacity
    /// * `release_fraction` - State of charge at which vehicles leave
    pub fn new(
        stations: Vec<ChargingStation>,
        charge_rate_per_tick: f64,
        release_fraction: f64,
    ) -> Self {
        Self {
            stations,
            charge_rate_per_tick,
            release_fraction,
        }
    }

    pub fn stations(&self) -> &[ChargingStation] {
        &self.stations
    }

    pub fn get(&self, id: StationId) -> Option<&ChargingStation> {
        self.stations.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn available_count(&self) -> usize {
        self.stations.iter().filter(|s| s.available()).count()
    }

    /// Nearest free station to `from` by great-circle distance.
    ///
    /// Ties go to the lowest station id.
    pub fn nearest_available(&self, from: GeoPoint) -> Option<StationId> {
        let mut best: Option<(f64, StationId)> = None;
        for s in self.stations.iter().filter(|s| s.available()) {
            let d = from.distance_km(s.position);
            match best {
                Some((bd, _)) if d >= bd => {}
                _ => best = Some((d, s.id)),
            }
        }
        best.map(|(_, id)| id)
    }

    fn station_mut(&mut self, id: StationId) -> Result<&mut ChargingStation, StationError> {
        self.stations
            .get_mut(id.index())
            .ok_or(StationError::UnknownStation(id))
    }

    /// Claims a free station for `vehicle`.
    pub fn reserve(&mut self, id: StationId, vehicle: VehicleId) -> Result<(), StationError> {
        let s = self.station_mut(id)?;
        if s.phase != StationPhase::Free {
            return Err(StationError::NotAvailable {
                station: id,
                phase: s.phase,
            });
        }
        s.phase = StationPhase::Reserved(vehicle);
        Ok(())
    }

    /// Converts `vehicle`'s reservation into occupancy.
    pub fn occupy(&mut self, id: StationId, vehicle: VehicleId) -> Result<(), StationError> {
        let s = self.station_mut(id)?;
        if s.phase != StationPhase::Reserved(vehicle) {
            return Err(StationError::NotReservedBy {
                station: id,
                vehicle,
                phase: s.phase,
            });
        }
        s.phase = StationPhase::Occupied(vehicle);
        Ok(())
    }

    /// Drops `vehicle`'s reservation without it ever arriving.
    pub fn release_reservation(
        &mut self,
        id: StationId,
        vehicle: VehicleId,
    ) -> Result<(), StationError> {
        let s = self.station_mut(id)?;
        if s.phase != StationPhase::Reserved(vehicle) {
            return Err(StationError::NotReservedBy {
                station: id,
                vehicle,
                phase: s.phase,
            });
        }
        s.phase = StationPhase::Free;
        Ok(())
    }

    /// Sum of capacities of stations with a vehicle drawing power (kW).
    ///
    /// Reserved stations do not count; their vehicle is still en route.
    pub fn occupied_capacity_kw(&self) -> f64 {
        self.stations
            .iter()
            .filter(|s| s.occupant().is_some())
            .map(|s| s.capacity_kw)
            .sum()
    }

    /// Charges every occupant and releases those that reached the release
    /// threshold.
    ///
    /// A released vehicle goes back to `Idle` with an empty route so the
    /// coordinator plans a fresh trip on the next tick.
    pub fn tick(&mut self, vehicles: &mut [Vehicle]) -> ChargeReport {
        let mut report = ChargeReport::default();

        for s in &mut self.stations {
            let Some(vid) = s.occupant() else {
                continue;
            };
            let Some(v) = vehicles.get_mut(vid.index()) else {
                warn!(station = %s.id, vehicle = %vid, "occupant missing from fleet, freeing station");
                s.phase = StationPhase::Free;
                continue;
            };

            let delta = v.charge(s.capacity_kw * self.charge_rate_per_tick);
            report.delivered_kwh += delta;

            if v.reserve_kwh() >= self.release_fraction * v.capacity_kwh() {
                info!(
                    station = %s.id,
                    vehicle = %vid,
                    reserve_kwh = v.reserve_kwh(),
                    "charging complete"
                );
                s.phase = StationPhase::Free;
                v.state = VehicleState::Idle;
                v.destination = Destination::None;
                v.route.clear();
                report.completed.push(vid);
            }
        }

        report
    }
}
