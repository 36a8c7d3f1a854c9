//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;

use fleet_charge_sim::config::{ScenarioConfig, SiteConfig, VehicleConfig};
use fleet_charge_sim::fleet::{VehicleId, VehicleState};
use fleet_charge_sim::geo::GeoPoint;
use fleet_charge_sim::grid::StationPhase;
use fleet_charge_sim::network::{NodeId, RoadGraph, RoadGraphBuilder, RoadNetworkPort};
use fleet_charge_sim::sim::Snapshot;

/// Start of every scripted road.
pub fn origin() -> GeoPoint {
    GeoPoint::new(51.7520, -1.2577)
}

/// Straight road running north from [`origin`], `nodes` intersections
/// `spacing_km` apart.
pub fn line_network(nodes: usize, spacing_km: f64) -> RoadGraph {
    let mut b = RoadGraphBuilder::new();
    let ids: Vec<_> = (0..nodes)
        .map(|i| b.add_node(origin().offset_km(i as f64 * spacing_km, 0.0)))
        .collect();
    for pair in ids.windows(2) {
        b.add_road(pair[0], pair[1]).unwrap();
    }
    b.build()
}

/// Position of `node` on `graph`.
pub fn node(graph: &RoadGraph, node: u32) -> GeoPoint {
    graph.node_position(NodeId(node)).unwrap()
}

/// Scenario with no random vehicles, no solar, one plant, and the given
/// hand-placed vehicles `(position, reserve_kwh)` and 50 kW stations.
pub fn scripted_config(vehicles: &[(GeoPoint, f64)], stations: &[GeoPoint]) -> ScenarioConfig {
    let mut cfg = ScenarioConfig::small();
    cfg.fleet.count = 0;
    cfg.fleet.vehicles = vehicles
        .iter()
        .map(|&(p, reserve_kwh)| VehicleConfig {
            lat: p.lat,
            lon: p.lon,
            capacity_kwh: Some(60.0),
            reserve_kwh,
        })
        .collect();
    cfg.stations = stations
        .iter()
        .map(|p| SiteConfig::new(p.lat, p.lon, 50.0))
        .collect();
    cfg.solar_panels.clear();
    cfg
}

/// Asserts every structural invariant that must hold after any tick.
pub fn check_invariants(snap: &Snapshot) {
    for v in &snap.vehicles {
        assert!(
            v.reserve_kwh >= 0.0 && v.reserve_kwh <= v.capacity_kwh,
            "tick {}: {} reserve {} outside [0, {}]",
            snap.tick,
            v.label,
            v.reserve_kwh,
            v.capacity_kwh
        );
        assert_eq!(v.stranded, v.state == VehicleState::Stranded);
    }

    let mut holders: HashSet<VehicleId> = HashSet::new();
    for s in &snap.stations {
        assert_eq!(
            s.available,
            s.phase == StationPhase::Free,
            "tick {}: {} availability disagrees with {:?}",
            snap.tick,
            s.label,
            s.phase
        );
        let holder = match s.phase {
            StationPhase::Free => continue,
            StationPhase::Reserved(v) => v,
            StationPhase::Occupied(v) => {
                assert_eq!(
                    snap.vehicles[v.index()].state,
                    VehicleState::Charging,
                    "tick {}: occupant {v} of {} is not charging",
                    snap.tick,
                    s.label
                );
                v
            }
        };
        assert!(
            holders.insert(holder),
            "tick {}: {holder} holds two stations",
            snap.tick
        );
    }

    for v in snap
        .vehicles
        .iter()
        .filter(|v| v.state == VehicleState::Charging)
    {
        assert!(
            snap.stations.iter().any(|s| s.occupant == Some(v.id)),
            "tick {}: {} charging without a station",
            snap.tick,
            v.label
        );
    }

    assert!(snap.balance.plant_kw >= 0.0);
    assert!(snap.balance.renewable_kw >= 0.0);
    assert!(snap.balance.unmet_kw >= 0.0);
}
