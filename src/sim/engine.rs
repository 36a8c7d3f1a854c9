//! Simulation engine: owns the world and drives one tick at a time.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use super::clock::SimClock;
use super::types::{PowerSourceView, Snapshot, StationView, TickSummary, VehicleView};
use crate::config::ScenarioConfig;
use crate::energy::EnergyModel;
use crate::error::SimError;
use crate::fleet::{CoordinatorParams, Vehicle, VehicleCoordinator, VehicleId};
use crate::geo::GeoPoint;
use crate::grid::{
    ChargingStation, ChargingStationPool, PowerBalanceModel, PowerPlant, SolarPanel, StationId,
};
use crate::network::{NodeId, RoadGraph, RoadNetworkPort};

/// Offset between the placement RNG stream and the routing RNG stream.
const PLACEMENT_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Everything the tick mutates.
#[derive(Debug, Clone)]
pub struct World {
    /// Indexed by [`VehicleId`].
    pub vehicles: Vec<Vehicle>,
    pub stations: ChargingStationPool,
    pub power: PowerBalanceModel,
}

impl World {
    /// Builds stations, power sources and the fleet described by `cfg`.
    ///
    /// Explicit vehicles come first; `fleet.count` more are placed on random
    /// road nodes (or at `fallback` if the network has no nodes).
    fn from_config<N: RoadNetworkPort>(
        cfg: &ScenarioConfig,
        network: &N,
        fallback: GeoPoint,
    ) -> Self {
        let stations = cfg
            .stations
            .iter()
            .enumerate()
            .map(|(i, s)| ChargingStation::new(StationId(i as u32), s.position(), s.capacity_kw))
            .collect();
        let stations = ChargingStationPool::new(
            stations,
            cfg.charging.charge_rate_per_tick,
            cfg.charging.release_fraction,
        );

        let plants = cfg
            .power_plants
            .iter()
            .enumerate()
            .map(|(i, p)| PowerPlant::new(i as u32 + 1, p.position(), p.capacity_kw))
            .collect();
        let panels = cfg
            .solar_panels
            .iter()
            .enumerate()
            .map(|(i, p)| SolarPanel::new(i as u32, p.position(), p.capacity_kw))
            .collect();

        let f = &cfg.fleet;
        let mut vehicles = Vec::with_capacity(cfg.vehicle_count());
        for v in &f.vehicles {
            let id = VehicleId(vehicles.len() as u32);
            let capacity = v.capacity_kwh.unwrap_or(f.capacity_kwh);
            vehicles.push(Vehicle::new(
                id,
                GeoPoint::new(v.lat, v.lon),
                capacity,
                v.reserve_kwh,
            ));
        }

        let mut rng = StdRng::seed_from_u64(cfg.simulation.seed ^ PLACEMENT_STREAM);
        let nodes = network.node_count();
        for _ in 0..f.count {
            let id = VehicleId(vehicles.len() as u32);
            let position = if nodes > 0 {
                let node = NodeId(rng.random_range(0..nodes) as u32);
                network.node_position(node).unwrap_or(fallback)
            } else {
                fallback
            };
            let fraction = rng.random_range(f.initial_reserve_min..=f.initial_reserve_max);
            vehicles.push(Vehicle::new(
                id,
                position,
                f.capacity_kwh,
                f.capacity_kwh * fraction,
            ));
        }

        Self {
            vehicles,
            stations,
            power: PowerBalanceModel::new(plants, panels),
        }
    }
}

/// A complete fleet simulation over a road network `N`.
///
/// Each [`step`](Simulation::step) runs the coordinator, then the charging
/// pool, then the power balance, and finally advances the clock.
#[derive(Debug)]
pub struct Simulation<N: RoadNetworkPort> {
    clock: SimClock,
    world: World,
    coordinator: VehicleCoordinator,
    network: N,
    last: TickSummary,
}

impl Simulation<RoadGraph> {
    /// Validates `cfg`, builds its road network, and assembles the simulation.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] with every violated constraint, or
    /// [`SimError::Network`] if the road graph cannot be built.
    pub fn from_config(cfg: &ScenarioConfig) -> Result<Self, SimError> {
        check(cfg)?;
        let network = cfg.network.build()?;
        Ok(Self::assemble(cfg, network))
    }
}

impl<N: RoadNetworkPort> Simulation<N> {
    /// Assembles a simulation over a caller-supplied road network.
    ///
    /// The `[network]` section of `cfg` is ignored except as a placement
    /// fallback for empty graphs.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] with every violated constraint.
    pub fn new(cfg: &ScenarioConfig, network: N) -> Result<Self, SimError> {
        check(cfg)?;
        Ok(Self::assemble(cfg, network))
    }

    fn assemble(cfg: &ScenarioConfig, network: N) -> Self {
        let world = World::from_config(cfg, &network, cfg.network.center());
        let params = CoordinatorParams {
            low_energy_fraction: cfg.fleet.low_energy_fraction,
            progress_per_tick: cfg.fleet.progress_per_tick,
            energy: EnergyModel::new(cfg.fleet.consumption_kwh_per_km),
        };
        let clock = SimClock::new(cfg.simulation.tick_minutes, cfg.simulation.start_hour);
        let last = TickSummary::initial(clock.hour_of_day(), &world.vehicles);

        info!(
            vehicles = world.vehicles.len(),
            stations = world.stations.len(),
            nodes = network.node_count(),
            seed = cfg.simulation.seed,
            "simulation ready"
        );

        Self {
            clock,
            world,
            coordinator: VehicleCoordinator::new(params, cfg.simulation.seed),
            network,
            last,
        }
    }

    /// Advances exactly one tick and returns the resulting snapshot.
    pub fn step(&mut self) -> Snapshot {
        self.tick();
        self.snapshot()
    }

    /// Advances one tick, returning only the summary.
    pub fn tick(&mut self) -> TickSummary {
        let hour = self.clock.hour_of_day();
        let World {
            vehicles,
            stations,
            power,
        } = &mut self.world;

        let advance = self.coordinator.advance(vehicles, stations, &self.network);
        let charge = stations.tick(vehicles);
        let balance = power.tick(hour, stations);
        self.clock.tick();

        self.last = TickSummary::new(
            self.clock.current(),
            hour,
            vehicles,
            &advance,
            &charge,
            balance,
        );
        debug!(tick = self.last.tick, hour, ?advance, "tick complete");
        self.last
    }

    /// Runs `ticks` ticks and returns their summaries.
    pub fn run(&mut self, ticks: usize) -> Vec<TickSummary> {
        (0..ticks).map(|_| self.tick()).collect()
    }

    /// Runs `ticks` ticks, calling `f` with each snapshot.
    pub fn run_with(&mut self, ticks: usize, mut f: impl FnMut(&Snapshot)) {
        for _ in 0..ticks {
            let snap = self.step();
            f(&snap);
        }
    }

    /// Current state, as of the last completed tick.
    pub fn snapshot(&self) -> Snapshot {
        let power_sources = self
            .world
            .power
            .plants()
            .iter()
            .map(PowerSourceView::from)
            .chain(self.world.power.panels().iter().map(PowerSourceView::from))
            .collect();

        Snapshot {
            tick: self.clock.current(),
            hour: self.last.hour,
            vehicles: self.world.vehicles.iter().map(VehicleView::from).collect(),
            stations: self
                .world
                .stations
                .stations()
                .iter()
                .map(StationView::from)
                .collect(),
            power_sources,
            balance: self.world.power.balance(),
            summary: self.last,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for scripted scenarios.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Simulated hours per tick.
    pub fn tick_hours(&self) -> f64 {
        self.clock.tick_minutes() / 60.0
    }

    pub fn last_summary(&self) -> &TickSummary {
        &self.last
    }
}

fn check(cfg: &ScenarioConfig) -> Result<(), SimError> {
    let errors = cfg.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(errors))
    }
}
