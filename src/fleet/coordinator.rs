use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::route::Advance;
use super::vehicle::{Destination, Vehicle, VehicleState};
use crate::energy::EnergyModel;
use crate::grid::{ChargingStationPool, StationId};
use crate::network::{NoPathFound, NodeId, RoadNetworkPort, Waypoint};

/// Tunables for routing and movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorParams {
    /// Below this fraction of capacity a vehicle looks for a charger.
    pub low_energy_fraction: f64,
    /// Fraction of a hop covered per tick, independent of hop length.
    pub progress_per_tick: f64,
    pub energy: EnergyModel,
}

impl Default for CoordinatorParams {
    fn default() -> Self {
        Self {
            low_energy_fraction: 0.30,
            progress_per_tick: 0.8,
            energy: EnergyModel::new(0.02),
        }
    }
}

/// Counts of what happened during one [`VehicleCoordinator::advance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Vehicles given any new route.
    pub routed: usize,
    /// Stations reserved.
    pub reserved: usize,
    /// Vehicles that reached a reserved station and started charging.
    pub arrived: usize,
    /// Vehicles that ran out of energy.
    pub stranded: usize,
    /// Idle vehicles that could not get any route.
    pub unrouted: usize,
}

/// Why a charging trip was abandoned in favour of a random route.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
enum TripRejected {
    #[error(transparent)]
    NoPath(#[from] NoPathFound),

    #[error("station is off the road network")]
    StationUnreachable,

    #[error("needs {needed_kwh:.3} kWh, has {reserve_kwh:.3} kWh")]
    InsufficientEnergy { needed_kwh: f64, reserve_kwh: f64 },
}

/// Per-tick routing, movement and arrival logic for the whole fleet.
///
/// Owns the seeded RNG used for random destinations, so a fixed seed and a
/// deterministic road network give reproducible runs.
#[derive(Debug, Clone)]
pub struct VehicleCoordinator {
    params: CoordinatorParams,
    rng: StdRng,
}

impl VehicleCoordinator {
    pub fn new(params: CoordinatorParams, seed: u64) -> Self {
        Self {
            params,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn params(&self) -> &CoordinatorParams {
        &self.params
    }

    /// Advances every vehicle by one tick, in id order.
    ///
    /// Charging and stranded vehicles are skipped. Vehicles without a usable
    /// route plan one (reserving a station when low on energy) and then move
    /// in the same tick.
    pub fn advance<N: RoadNetworkPort>(
        &mut self,
        vehicles: &mut [Vehicle],
        stations: &mut ChargingStationPool,
        network: &N,
    ) -> AdvanceReport {
        let mut report = AdvanceReport::default();

        for v in vehicles.iter_mut() {
            if matches!(v.state, VehicleState::Charging | VehicleState::Stranded) {
                continue;
            }

            if v.route.is_exhausted() {
                v.state = VehicleState::Idle;
                self.plan(v, stations, network, &mut report);
            }

            if v.state == VehicleState::Moving {
                self.drive(v, stations, &mut report);
            }
        }

        report
    }

    fn plan<N: RoadNetworkPort>(
        &mut self,
        v: &mut Vehicle,
        stations: &mut ChargingStationPool,
        network: &N,
        report: &mut AdvanceReport,
    ) {
        let Some(start) = network.nearest_node(v.position) else {
            report.unrouted += 1;
            return;
        };

        if v.is_below(self.params.low_energy_fraction) {
            match stations.nearest_available(v.position) {
                Some(station) => {
                    v.state = VehicleState::Routing;
                    match self.plan_charging_trip(v, station, start, stations, network) {
                        Ok(path) => {
                            self.accept_charging_trip(v, station, path, stations, report);
                            if v.state != VehicleState::Routing {
                                return;
                            }
                        }
                        Err(reason) => {
                            debug!(vehicle = %v.id, %station, %reason, "charging trip rejected");
                        }
                    }
                    v.state = VehicleState::Idle;
                }
                None => debug!(vehicle = %v.id, "no station available"),
            }
        }

        self.plan_random_trip(v, start, network, report);
    }

    fn plan_charging_trip<N: RoadNetworkPort>(
        &self,
        v: &Vehicle,
        station: StationId,
        start: NodeId,
        stations: &ChargingStationPool,
        network: &N,
    ) -> Result<Vec<Waypoint>, TripRejected> {
        let end = stations
            .get(station)
            .and_then(|s| network.nearest_node(s.position))
            .ok_or(TripRejected::StationUnreachable)?;
        let path = network.shortest_path(start, end)?;

        let needed_kwh = self
            .params
            .energy
            .path_energy_kwh(path.iter().map(|w| w.position));
        if needed_kwh > v.reserve_kwh() {
            return Err(TripRejected::InsufficientEnergy {
                needed_kwh,
                reserve_kwh: v.reserve_kwh(),
            });
        }
        Ok(path)
    }

    /// Commits `v` to `station`. Leaves `v` in `Routing` if the reservation
    /// failed so the caller can fall back.
    fn accept_charging_trip(
        &self,
        v: &mut Vehicle,
        station: StationId,
        path: Vec<Waypoint>,
        stations: &mut ChargingStationPool,
        report: &mut AdvanceReport,
    ) {
        if let Err(e) = stations.reserve(station, v.id) {
            warn!(vehicle = %v.id, error = %e, "reservation refused");
            return;
        }
        report.reserved += 1;
        report.routed += 1;
        info!(vehicle = %v.id, %station, hops = path.len().saturating_sub(1), "station reserved");

        if let Some(first) = path.first() {
            v.position = first.position;
        }
        v.route.set(path);
        v.destination = Destination::ChargingStation(station);
        v.state = VehicleState::Moving;

        // Already parked at the station's node.
        if v.route.is_exhausted() {
            self.arrive(v, stations, report);
        }
    }

    fn plan_random_trip<N: RoadNetworkPort>(
        &mut self,
        v: &mut Vehicle,
        start: NodeId,
        network: &N,
        report: &mut AdvanceReport,
    ) {
        let n = network.node_count();
        if n == 0 {
            report.unrouted += 1;
            return;
        }
        let target = NodeId(self.rng.random_range(0..n) as u32);

        match network.shortest_path(start, target) {
            Ok(path) => {
                debug!(vehicle = %v.id, %target, waypoints = path.len(), "random route");
                if let Some(first) = path.first() {
                    v.position = first.position;
                }
                v.route.set(path);
                v.destination = Destination::None;
                if v.route.is_exhausted() {
                    v.state = VehicleState::Idle;
                } else {
                    v.state = VehicleState::Moving;
                    report.routed += 1;
                }
            }
            Err(e) => {
                debug!(vehicle = %v.id, error = %e, "no random route this tick");
                v.state = VehicleState::Idle;
                report.unrouted += 1;
            }
        }
    }

    fn drive(
        &self,
        v: &mut Vehicle,
        stations: &mut ChargingStationPool,
        report: &mut AdvanceReport,
    ) {
        let (Some(current), Some(next)) = (v.route.current(), v.route.next()) else {
            return;
        };
        let hop_kwh = self
            .params
            .energy
            .hop_energy_kwh(current.position, next.position);

        if hop_kwh > v.reserve_kwh() {
            self.strand(v, stations, hop_kwh);
            report.stranded += 1;
            return;
        }

        match v.route.advance(self.params.progress_per_tick) {
            Some(Advance::Partial(pos)) => v.position = pos,
            Some(Advance::HopCompleted(wp)) => {
                v.position = wp.position;
                v.draw(hop_kwh);
                if v.route.is_exhausted() && v.destination.station().is_some() {
                    self.arrive(v, stations, report);
                }
            }
            None => {}
        }
    }

    fn arrive(
        &self,
        v: &mut Vehicle,
        stations: &mut ChargingStationPool,
        report: &mut AdvanceReport,
    ) {
        let Some(station) = v.destination.station() else {
            return;
        };
        v.destination = Destination::None;
        match stations.occupy(station, v.id) {
            Ok(()) => {
                v.state = VehicleState::Charging;
                report.arrived += 1;
                info!(vehicle = %v.id, %station, reserve_kwh = v.reserve_kwh(), "arrived, charging");
            }
            Err(e) => {
                warn!(vehicle = %v.id, error = %e, "arrived without a valid reservation");
            }
        }
    }

    fn strand(&self, v: &mut Vehicle, stations: &mut ChargingStationPool, hop_kwh: f64) {
        v.state = VehicleState::Stranded;
        if let Some(station) = v.destination.station() {
            if let Err(e) = stations.release_reservation(station, v.id) {
                warn!(vehicle = %v.id, error = %e, "could not release reservation");
            }
        }
        v.destination = Destination::None;
        info!(
            vehicle = %v.id,
            reserve_kwh = v.reserve_kwh(),
            needed_kwh = hop_kwh,
            "stranded"
        );
    }
}
