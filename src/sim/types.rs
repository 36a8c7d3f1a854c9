//! Read-only views published after every tick.

use std::fmt;

use serde::Serialize;

use crate::fleet::{AdvanceReport, Destination, Vehicle, VehicleId, VehicleState};
use crate::geo::GeoPoint;
use crate::grid::{
    ChargeReport, ChargingStation, PowerBalance, PowerPlant, SolarPanel, StationId, StationPhase,
};

/// Complete, serializable state after a tick.
///
/// Two runs with the same configuration and seed produce identical
/// snapshots, field for field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Ticks completed.
    pub tick: u64,
    /// Simulated hour of day the last tick was evaluated at.
    pub hour: f64,
    pub vehicles: Vec<VehicleView>,
    pub stations: Vec<StationView>,
    pub power_sources: Vec<PowerSourceView>,
    pub balance: PowerBalance,
    pub summary: TickSummary,
}

impl Snapshot {
    pub fn vehicle(&self, id: VehicleId) -> Option<&VehicleView> {
        self.vehicles.get(id.index()).filter(|v| v.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleView {
    pub id: VehicleId,
    pub label: String,
    pub position: GeoPoint,
    pub state: VehicleState,
    pub reserve_kwh: f64,
    pub capacity_kwh: f64,
    pub state_of_charge: f64,
    /// Waypoints not yet reached, including the one being approached.
    pub route_remaining: Vec<GeoPoint>,
    pub destination: Destination,
    pub stranded: bool,
}

impl From<&Vehicle> for VehicleView {
    fn from(v: &Vehicle) -> Self {
        let remaining = v.route.remaining();
        Self {
            id: v.id,
            label: v.id.to_string(),
            position: v.position,
            state: v.state,
            reserve_kwh: v.reserve_kwh(),
            capacity_kwh: v.capacity_kwh(),
            state_of_charge: v.state_of_charge(),
            route_remaining: remaining.iter().skip(1).map(|w| w.position).collect(),
            destination: v.destination,
            stranded: v.is_stranded(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationView {
    pub id: StationId,
    pub label: String,
    pub position: GeoPoint,
    pub capacity_kw: f64,
    pub available: bool,
    pub phase: StationPhase,
    pub occupant: Option<VehicleId>,
}

impl From<&ChargingStation> for StationView {
    fn from(s: &ChargingStation) -> Self {
        Self {
            id: s.id,
            label: s.id.to_string(),
            position: s.position,
            capacity_kw: s.capacity_kw,
            available: s.available(),
            phase: s.phase(),
            occupant: s.occupant(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSourceKind {
    Plant,
    Solar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerSourceView {
    pub id: String,
    pub kind: PowerSourceKind,
    pub position: GeoPoint,
    pub capacity_kw: f64,
    pub current_output_kw: f64,
}

impl From<&PowerPlant> for PowerSourceView {
    fn from(p: &PowerPlant) -> Self {
        Self {
            id: p.label(),
            kind: PowerSourceKind::Plant,
            position: p.position,
            capacity_kw: p.capacity_kw,
            current_output_kw: p.current_output_kw,
        }
    }
}

impl From<&SolarPanel> for PowerSourceView {
    fn from(p: &SolarPanel) -> Self {
        Self {
            id: p.label(),
            kind: PowerSourceKind::Solar,
            position: p.position,
            capacity_kw: p.capacity_kw,
            current_output_kw: p.current_output_kw,
        }
    }
}

/// Compact record of one tick: fleet counts, events and the power balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TickSummary {
    /// Ticks completed, including this one.
    pub tick: u64,
    pub hour: f64,
    pub idle: usize,
    pub moving: usize,
    pub charging: usize,
    pub stranded: usize,
    /// Vehicles given a new route.
    pub routed: usize,
    /// Stations reserved.
    pub reserved: usize,
    /// Vehicles that started charging.
    pub arrived: usize,
    /// Charging sessions completed.
    pub completed: usize,
    /// Energy delivered by stations (kWh).
    pub delivered_kwh: f64,
    /// Mean state of charge over the fleet.
    pub mean_state_of_charge: f64,
    pub balance: PowerBalance,
}

impl TickSummary {
    pub(crate) fn new(
        tick: u64,
        hour: f64,
        vehicles: &[Vehicle],
        advance: &AdvanceReport,
        charge: &ChargeReport,
        balance: PowerBalance,
    ) -> Self {
        let mut s = Self {
            tick,
            hour,
            routed: advance.routed,
            reserved: advance.reserved,
            arrived: advance.arrived,
            completed: charge.completed.len(),
            delivered_kwh: charge.delivered_kwh,
            balance,
            ..Self::default()
        };
        s.count_states(vehicles);
        s
    }

    /// Summary for a world that has not been stepped yet.
    pub(crate) fn initial(hour: f64, vehicles: &[Vehicle]) -> Self {
        let mut s = Self {
            hour,
            ..Self::default()
        };
        s.count_states(vehicles);
        s
    }

    fn count_states(&mut self, vehicles: &[Vehicle]) {
        let mut soc_sum = 0.0;
        for v in vehicles {
            soc_sum += v.state_of_charge();
            match v.state {
                VehicleState::Idle | VehicleState::Routing => self.idle += 1,
                VehicleState::Moving => self.moving += 1,
                VehicleState::Charging => self.charging += 1,
                VehicleState::Stranded => self.stranded += 1,
            }
        }
        self.mean_state_of_charge = if vehicles.is_empty() {
            0.0
        } else {
            soc_sum / vehicles.len() as f64
        };
    }
}

impl fmt::Display for TickSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = (self.hour * 60.0).round() as u64 % (24 * 60);
        write!(
            f,
            "t={:>4} ({:02}:{:02}) | moving={:<3} idle={:<3} charging={:<3} stranded={:<3} \
             | SoC={:>5.1}% | demand={:>7.1} kW  solar={:>6.1} kW  plant={:>7.1} kW",
            self.tick,
            minutes / 60,
            minutes % 60,
            self.moving,
            self.idle,
            self.charging,
            self.stranded,
            self.mean_state_of_charge * 100.0,
            self.balance.demand_kw,
            self.balance.renewable_kw,
            self.balance.plant_kw,
        )?;
        if self.balance.unmet_kw > 0.0 {
            write!(f, "  unmet={:.1} kW", self.balance.unmet_kw)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(id: u32, reserve: f64, state: VehicleState) -> Vehicle {
        let mut v = Vehicle::new(VehicleId(id), GeoPoint::new(51.75, -1.25), 60.0, reserve);
        v.state = state;
        v
    }

    #[test]
    fn summary_counts_states() {
        let fleet = [
            vehicle(0, 30.0, VehicleState::Moving),
            vehicle(1, 60.0, VehicleState::Charging),
            vehicle(2, 0.0, VehicleState::Stranded),
            vehicle(3, 30.0, VehicleState::Idle),
        ];
        let s = TickSummary::initial(8.0, &fleet);
        assert_eq!((s.moving, s.charging, s.stranded, s.idle), (1, 1, 1, 1));
        assert!((s.mean_state_of_charge - 0.5).abs() < 1e-12);
    }

    #[test]
    fn summary_display_shows_clock_time() {
        let s = TickSummary {
            tick: 3,
            hour: 13.5,
            ..TickSummary::default()
        };
        let line = s.to_string();
        assert!(line.contains("13:30"), "{line}");
        assert!(!line.contains("unmet"));
    }

    #[test]
    fn vehicle_view_lists_upcoming_waypoints_only() {
        use crate::network::{NodeId, Waypoint};

        let mut v = vehicle(0, 30.0, VehicleState::Moving);
        let wp = |i: u32| Waypoint {
            node: NodeId(i),
            position: GeoPoint::new(51.75 + f64::from(i) * 0.001, -1.25),
        };
        v.route.set(vec![wp(0), wp(1), wp(2)]);
        let view = VehicleView::from(&v);
        assert_eq!(view.route_remaining.len(), 2);
        assert_eq!(view.label, "V_0");
        assert!(!view.stranded);
    }
}
