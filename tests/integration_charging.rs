//! End-to-end charging scenarios on scripted road networks.

mod common;

use fleet_charge_sim::fleet::{Destination, VehicleId, VehicleState};
use fleet_charge_sim::grid::{StationId, StationPhase};
use fleet_charge_sim::network::{NodeId, RoadGraphBuilder, RoadNetworkPort};
use fleet_charge_sim::sim::Simulation;

#[test]
fn low_vehicle_reserves_reachable_station_and_starts_moving() {
    // Two 1.5 km segments: 3 km at 0.02 kWh/km needs 0.06 kWh.
    let graph = common::line_network(3, 1.5);
    let cfg = common::scripted_config(&[(common::origin(), 10.0)], &[common::node(&graph, 2)]);
    let mut sim = Simulation::new(&cfg, graph).unwrap();

    let snap = sim.step();
    common::check_invariants(&snap);

    let v = &snap.vehicles[0];
    assert_eq!(v.state, VehicleState::Moving);
    assert_eq!(v.destination, Destination::ChargingStation(StationId(0)));
    assert_eq!(v.reserve_kwh, 10.0, "no energy charged before a hop completes");
    assert!(!snap.stations[0].available);
    assert_eq!(snap.stations[0].phase, StationPhase::Reserved(VehicleId(0)));
    assert_eq!(snap.summary.reserved, 1);
}

#[test]
fn vehicle_arrives_and_occupies_after_completing_route() {
    let graph = common::line_network(3, 1.5);
    let cfg = common::scripted_config(&[(common::origin(), 10.0)], &[common::node(&graph, 2)]);
    let mut sim = Simulation::new(&cfg, graph).unwrap();

    // 0.8 progress per tick: each hop takes two ticks.
    let states: Vec<_> = (0..4).map(|_| sim.step()).collect();
    for s in &states {
        common::check_invariants(s);
    }
    assert!(states[..3]
        .iter()
        .all(|s| s.vehicles[0].state == VehicleState::Moving));

    let arrived = &states[3];
    let v = &arrived.vehicles[0];
    assert_eq!(v.state, VehicleState::Charging);
    assert_eq!(v.destination, Destination::None);
    assert_eq!(arrived.stations[0].occupant, Some(VehicleId(0)));
    // 3 km of travel, then one tick of 50 kW × 0.016.
    assert!((v.reserve_kwh - (10.0 - 0.06 + 0.8)).abs() < 1e-3);
    assert_eq!(arrived.balance.demand_kw, 50.0);
}

#[test]
fn two_low_vehicles_compete_for_one_station() {
    let graph = common::line_network(3, 1.5);
    let station = common::node(&graph, 2);
    let cfg = common::scripted_config(
        &[(common::origin(), 10.0), (common::origin(), 10.0)],
        &[station],
    );
    let mut sim = Simulation::new(&cfg, graph).unwrap();

    let snap = sim.step();
    common::check_invariants(&snap);

    assert_eq!(snap.summary.reserved, 1);
    assert_eq!(snap.stations[0].phase, StationPhase::Reserved(VehicleId(0)));
    let loser = &snap.vehicles[1];
    assert_eq!(loser.destination, Destination::None);
    assert!(matches!(loser.state, VehicleState::Moving | VehicleState::Idle));
}

#[test]
fn charging_completes_within_bound_and_releases_same_tick() {
    // Vehicle parked on the station node: arrival is immediate.
    let graph = common::line_network(3, 1.5);
    let cfg = common::scripted_config(&[(common::origin(), 10.0)], &[common::node(&graph, 0)]);
    let mut sim = Simulation::new(&cfg, graph).unwrap();

    // ceil((0.8 × 60 - 10) / (50 × 0.016)) = 48
    let bound = ((0.8 * 60.0 - 10.0) / (50.0 * 0.016_f64)).ceil() as u64;
    assert_eq!(bound, 48);

    let mut released_at = None;
    for _ in 0..bound + 5 {
        let snap = sim.step();
        common::check_invariants(&snap);
        let v = &snap.vehicles[0];
        if snap.tick == 1 {
            assert_eq!(v.state, VehicleState::Charging);
        }
        if v.state != VehicleState::Charging {
            assert!(snap.stations[0].available, "station freed with the vehicle");
            assert!(v.reserve_kwh >= 0.8 * 60.0);
            released_at = Some(snap.tick);
            break;
        }
    }
    assert_eq!(released_at, Some(bound));
    assert_eq!(sim.last_summary().completed, 1);
}

#[test]
fn healthy_vehicle_never_reserves() {
    let graph = common::line_network(4, 0.5);
    let cfg = common::scripted_config(&[(common::origin(), 47.5)], &[common::node(&graph, 0)]);
    let mut sim = Simulation::new(&cfg, graph).unwrap();

    for _ in 0..20 {
        let snap = sim.step();
        common::check_invariants(&snap);
        assert_eq!(snap.summary.reserved, 0);
        assert!(snap.stations[0].available);
    }
}

#[test]
fn unreachable_station_falls_back_without_reserving() {
    // Station sits on an island node with no roads.
    let mut b = RoadGraphBuilder::new();
    let a = b.add_node(common::origin());
    let c = b.add_node(common::origin().offset_km(1.0, 0.0));
    b.add_road(a, c).unwrap();
    let island = b.add_node(common::origin().offset_km(0.0, 0.4));
    let graph = b.build();
    let island_pos = graph.node_position(island).unwrap();
    let cfg = common::scripted_config(&[(common::origin(), 5.0)], &[island_pos]);
    let mut sim = Simulation::new(&cfg, graph).unwrap();

    for _ in 0..10 {
        let snap = sim.step();
        common::check_invariants(&snap);
        assert!(snap.stations[0].available);
        assert_eq!(snap.vehicles[0].destination, Destination::None);
    }
    assert_eq!(sim.network().nearest_node(common::origin()), Some(NodeId(0)));
}
