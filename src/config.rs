//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::geo::GeoPoint;
use crate::network::{self, NetworkError, RoadGraph};

/// Oxford city centre, where the `oxford` preset is laid out.
pub const OXFORD_CENTER: GeoPoint = GeoPoint {
    lat: 51.7520,
    lon: -1.2577,
};

/// Top-level scenario configuration parsed from TOML.
///
/// Every section has defaults matching the `oxford` preset. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or pick a preset with
/// [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Timing and the master seed.
    pub simulation: SimulationConfig,
    /// Vehicle population and movement parameters.
    pub fleet: FleetConfig,
    /// Charging rate and release threshold shared by all stations.
    pub charging: ChargingConfig,
    pub stations: Vec<SiteConfig>,
    pub solar_panels: Vec<SiteConfig>,
    pub power_plants: Vec<SiteConfig>,
    /// Road network source.
    pub network: NetworkConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::oxford()
    }
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
    /// Ticks to run from the command line.
    pub ticks: usize,
    /// Simulated minutes per tick (must be > 0).
    pub tick_minutes: f64,
    /// Hour of day at tick 0, in `[0, 24)`.
    pub start_hour: f64,
    /// Wall-clock cadence of the HTTP stepper (ms).
    pub tick_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            ticks: 120,
            tick_minutes: 1.0,
            start_hour: 8.0,
            tick_interval_ms: 1000,
        }
    }
}

/// Vehicle population parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Number of randomly placed vehicles, added after any explicit ones.
    pub count: usize,
    /// Battery capacity of randomly placed vehicles (kWh).
    pub capacity_kwh: f64,
    /// Lower bound of the initial reserve, as a fraction of capacity.
    pub initial_reserve_min: f64,
    /// Upper bound of the initial reserve, as a fraction of capacity.
    pub initial_reserve_max: f64,
    pub consumption_kwh_per_km: f64,
    /// Fraction of a hop covered per tick.
    pub progress_per_tick: f64,
    /// Below this fraction of capacity a vehicle seeks a charger.
    pub low_energy_fraction: f64,
    /// Vehicles with an explicit position and reserve.
    pub vehicles: Vec<VehicleConfig>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            count: 10,
            capacity_kwh: 60.0,
            initial_reserve_min: 0.6,
            initial_reserve_max: 0.9,
            consumption_kwh_per_km: 0.02,
            progress_per_tick: 0.8,
            low_energy_fraction: 0.30,
            vehicles: Vec::new(),
        }
    }
}

/// A vehicle placed by hand.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleConfig {
    pub lat: f64,
    pub lon: f64,
    /// Defaults to `fleet.capacity_kwh`.
    #[serde(default)]
    pub capacity_kwh: Option<f64>,
    pub reserve_kwh: f64,
}

/// Charging behaviour shared by every station.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargingConfig {
    /// Energy delivered per tick per kW of station capacity (kWh/kW).
    pub charge_rate_per_tick: f64,
    /// State of charge at which a charging vehicle is released.
    pub release_fraction: f64,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            charge_rate_per_tick: 0.016,
            release_fraction: 0.80,
        }
    }
}

/// A fixed installation: station, panel or plant.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    pub lat: f64,
    pub lon: f64,
    pub capacity_kw: f64,
}

impl SiteConfig {
    pub const fn new(lat: f64, lon: f64, capacity_kw: f64) -> Self {
        Self {
            lat,
            lon,
            capacity_kw,
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Where the road graph comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkConfig {
    /// Generated rectangular street grid.
    Grid(GridConfig),
    /// Node and edge tables on disk.
    Csv { nodes_csv: PathBuf, edges_csv: PathBuf },
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig::Grid(GridConfig::default())
    }
}

impl NetworkConfig {
    /// Builds the road graph described by this section.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] if the grid is degenerate or the CSV files
    /// cannot be read.
    pub fn build(&self) -> Result<RoadGraph, NetworkError> {
        match self {
            NetworkConfig::Grid(g) => RoadGraph::grid(g.center(), g.rows, g.cols, g.spacing_km),
            NetworkConfig::Csv {
                nodes_csv,
                edges_csv,
            } => network::load_csv(nodes_csv, edges_csv),
        }
    }

    /// Approximate centre of the network, used when it has no nodes.
    pub fn center(&self) -> GeoPoint {
        match self {
            NetworkConfig::Grid(g) => g.center(),
            NetworkConfig::Csv { .. } => OXFORD_CENTER,
        }
    }
}

/// Street grid parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub rows: usize,
    pub cols: usize,
    /// Distance between neighbouring intersections (km).
    pub spacing_km: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        // Roughly the 3 km radius around the centre.
        Self {
            center_lat: OXFORD_CENTER.lat,
            center_lon: OXFORD_CENTER.lon,
            rows: 25,
            cols: 25,
            spacing_km: 0.25,
        }
    }
}

impl GridConfig {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.center_lat, self.center_lon)
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"fleet.capacity_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Five stations, one plant and four solar panels around central Oxford,
    /// ten vehicles on a 6 km street grid.
    pub fn oxford() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            fleet: FleetConfig::default(),
            charging: ChargingConfig::default(),
            stations: vec![
                SiteConfig::new(51.7520, -1.2577, 50.0),
                SiteConfig::new(51.7540, -1.2600, 50.0),
                SiteConfig::new(51.7500, -1.2500, 50.0),
                SiteConfig::new(51.7480, -1.2620, 50.0),
                SiteConfig::new(51.7560, -1.2540, 50.0),
            ],
            solar_panels: vec![
                SiteConfig::new(51.7510, -1.2590, 100.0),
                SiteConfig::new(51.7530, -1.2520, 100.0),
                SiteConfig::new(51.7490, -1.2550, 100.0),
                SiteConfig::new(51.7515, -1.2600, 100.0),
            ],
            power_plants: vec![SiteConfig::new(51.7420, -1.2677, 10_000.0)],
            network: NetworkConfig::default(),
        }
    }

    /// A compact scenario for quick runs: three vehicles, two stations and a
    /// 5×5 grid.
    pub fn small() -> Self {
        let oxford = Self::oxford();
        Self {
            simulation: SimulationConfig {
                ticks: 60,
                ..SimulationConfig::default()
            },
            fleet: FleetConfig {
                count: 3,
                ..FleetConfig::default()
            },
            stations: oxford.stations[..2].to_vec(),
            solar_panels: oxford.solar_panels[..1].to_vec(),
            network: NetworkConfig::Grid(GridConfig {
                rows: 5,
                cols: 5,
                spacing_km: 0.3,
                ..GridConfig::default()
            }),
            ..oxford
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["oxford", "small"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "oxford" => Ok(Self::oxford()),
            "small" => Ok(Self::small()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Total vehicles the scenario will create.
    pub fn vehicle_count(&self) -> usize {
        self.fleet.vehicles.len() + self.fleet.count
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if !(s.tick_minutes > 0.0) {
            errors.push(ConfigError::new("simulation.tick_minutes", "must be > 0"));
        }
        if !(0.0..24.0).contains(&s.start_hour) {
            errors.push(ConfigError::new("simulation.start_hour", "must be in [0, 24)"));
        }
        if s.tick_interval_ms == 0 {
            errors.push(ConfigError::new("simulation.tick_interval_ms", "must be > 0"));
        }

        let f = &self.fleet;
        if !(f.capacity_kwh > 0.0) {
            errors.push(ConfigError::new("fleet.capacity_kwh", "must be > 0"));
        }
        for (field, v) in [
            ("fleet.initial_reserve_min", f.initial_reserve_min),
            ("fleet.initial_reserve_max", f.initial_reserve_max),
            ("fleet.low_energy_fraction", f.low_energy_fraction),
        ] {
            if !(0.0..=1.0).contains(&v) {
                errors.push(ConfigError::new(field, "must be in [0.0, 1.0]"));
            }
        }
        if f.initial_reserve_min > f.initial_reserve_max {
            errors.push(ConfigError::new(
                "fleet.initial_reserve_min",
                "must be <= fleet.initial_reserve_max",
            ));
        }
        if !(f.consumption_kwh_per_km >= 0.0) {
            errors.push(ConfigError::new("fleet.consumption_kwh_per_km", "must be >= 0"));
        }
        if !(f.progress_per_tick > 0.0) {
            errors.push(ConfigError::new("fleet.progress_per_tick", "must be > 0"));
        }
        for (i, v) in f.vehicles.iter().enumerate() {
            let field = format!("fleet.vehicles[{i}]");
            check_coordinates(&mut errors, &field, v.lat, v.lon);
            let capacity = v.capacity_kwh.unwrap_or(f.capacity_kwh);
            if !(capacity > 0.0) {
                errors.push(ConfigError::new(format!("{field}.capacity_kwh"), "must be > 0"));
            }
            if !(0.0..=capacity).contains(&v.reserve_kwh) {
                errors.push(ConfigError::new(
                    format!("{field}.reserve_kwh"),
                    "must be in [0, capacity_kwh]",
                ));
            }
        }

        let c = &self.charging;
        if !(c.charge_rate_per_tick > 0.0) {
            errors.push(ConfigError::new("charging.charge_rate_per_tick", "must be > 0"));
        }
        if !(c.release_fraction > 0.0 && c.release_fraction <= 1.0) {
            errors.push(ConfigError::new("charging.release_fraction", "must be in (0.0, 1.0]"));
        }
        if f.low_energy_fraction >= c.release_fraction {
            errors.push(ConfigError::new(
                "fleet.low_energy_fraction",
                "must be < charging.release_fraction",
            ));
        }

        for (section, sites, strictly_positive) in [
            ("stations", &self.stations, true),
            ("solar_panels", &self.solar_panels, false),
            ("power_plants", &self.power_plants, false),
        ] {
            for (i, site) in sites.iter().enumerate() {
                let field = format!("{section}[{i}]");
                check_coordinates(&mut errors, &field, site.lat, site.lon);
                let ok = if strictly_positive {
                    site.capacity_kw > 0.0
                } else {
                    site.capacity_kw >= 0.0
                };
                if !ok {
                    let bound = if strictly_positive { "> 0" } else { ">= 0" };
                    errors.push(ConfigError::new(
                        format!("{field}.capacity_kw"),
                        format!("must be {bound}"),
                    ));
                }
            }
        }

        if let NetworkConfig::Grid(g) = &self.network {
            check_coordinates(&mut errors, "network", g.center_lat, g.center_lon);
            if g.rows == 0 || g.cols == 0 {
                errors.push(ConfigError::new("network.rows", "rows and cols must be > 0"));
            }
            if !(g.spacing_km > 0.0) {
                errors.push(ConfigError::new("network.spacing_km", "must be > 0"));
            }
        }

        errors
    }
}

fn check_coordinates(errors: &mut Vec<ConfigError>, field: &str, lat: f64, lon: f64) {
    if !(-90.0..=90.0).contains(&lat) {
        errors.push(ConfigError::new(format!("{field}.lat"), "must be in [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        errors.push(ConfigError::new(format!("{field}.lon"), "must be in [-180, 180]"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let e = ScenarioConfig::from_preset("nonexistent").unwrap_err();
        assert_eq!(e.field, "preset");
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn oxford_matches_city_layout() {
        let cfg = ScenarioConfig::oxford();
        assert_eq!(cfg.stations.len(), 5);
        assert_eq!(cfg.solar_panels.len(), 4);
        assert_eq!(cfg.power_plants.len(), 1);
        assert_eq!(cfg.power_plants[0].capacity_kw, 10_000.0);
        assert_eq!(cfg.vehicle_count(), 10);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
seed = 7
ticks = 30
start_hour = 11.5

[fleet]
count = 2
capacity_kwh = 40.0

[[fleet.vehicles]]
lat = 51.75
lon = -1.25
reserve_kwh = 5.0

[charging]
charge_rate_per_tick = 0.05

[[stations]]
lat = 51.751
lon = -1.251
capacity_kw = 22.0

[network]
kind = "grid"
rows = 4
cols = 6
spacing_km = 0.5
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.simulation.seed, 7);
        assert_eq!(cfg.simulation.tick_minutes, 1.0);
        assert_eq!(cfg.fleet.vehicles.len(), 1);
        assert_eq!(cfg.fleet.vehicles[0].capacity_kwh, None);
        assert_eq!(cfg.vehicle_count(), 3);
        assert_eq!(cfg.stations.len(), 1);
        // Unspecified site lists keep the preset's.
        assert_eq!(cfg.solar_panels.len(), 4);
        match &cfg.network {
            NetworkConfig::Grid(g) => {
                assert_eq!((g.rows, g.cols), (4, 6));
                assert_eq!(g.center_lat, OXFORD_CENTER.lat);
            }
            other => panic!("expected grid, got {other:?}"),
        }
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn csv_network_section_parses() {
        let toml = r#"
[network]
kind = "csv"
nodes_csv = "data/nodes.csv"
edges_csv = "data/edges.csv"
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert!(matches!(cfg.network, NetworkConfig::Csv { .. }));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[fleet]
count = 2
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_collects_every_error() {
        let mut cfg = ScenarioConfig::small();
        cfg.fleet.capacity_kwh = 0.0;
        cfg.simulation.tick_minutes = -1.0;
        cfg.stations[0].capacity_kw = 0.0;
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"fleet.capacity_kwh".to_string()));
        assert!(fields.contains(&"simulation.tick_minutes".to_string()));
        assert!(fields.contains(&"stations[0].capacity_kw".to_string()));
    }

    #[test]
    fn low_threshold_must_sit_below_release() {
        let mut cfg = ScenarioConfig::small();
        cfg.fleet.low_energy_fraction = 0.85;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.message == "must be < charging.release_fraction")
        );
    }

    #[test]
    fn explicit_reserve_above_capacity_is_rejected() {
        let mut cfg = ScenarioConfig::small();
        cfg.fleet.vehicles.push(VehicleConfig {
            lat: 51.75,
            lon: -1.25,
            capacity_kwh: Some(30.0),
            reserve_kwh: 31.0,
        });
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "fleet.vehicles[0].reserve_kwh"));
    }

    #[test]
    fn nan_fields_are_rejected() {
        let mut cfg = ScenarioConfig::small();
        cfg.fleet.progress_per_tick = f64::NAN;
        assert!(
            cfg.validate()
                .iter()
                .any(|e| e.field == "fleet.progress_per_tick")
        );
    }

    #[test]
    fn default_network_builds() {
        let graph = ScenarioConfig::small().network.build().unwrap();
        assert_eq!(crate::network::RoadNetworkPort::node_count(&graph), 25);
    }
}
