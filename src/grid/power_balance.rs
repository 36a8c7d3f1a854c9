//! Supply/demand balance between solar panels, the power plant and charging load.

use std::f64::consts::PI;

use serde::Serialize;

use super::station::ChargingStationPool;
use crate::geo::GeoPoint;

/// Daylight window in hours of the day, `[sunrise, sunset)`.
pub const DAYLIGHT_HOURS: (f64, f64) = (6.0, 18.0);

/// Fraction of panel capacity produced at `hour` (wraps at 24).
///
/// A half-sine peaking at noon, zero outside the daylight window.
///
/// # Examples
///
/// ```
/// use fleet_charge_sim::grid::power_balance::solar_fraction;
///
/// assert!((solar_fraction(12.0) - 1.0).abs() < 1e-12);
/// assert_eq!(solar_fraction(3.0), 0.0);
/// assert!((solar_fraction(36.0) - 1.0).abs() < 1e-12);
/// ```
pub fn solar_fraction(hour: f64) -> f64 {
    let h = hour.rem_euclid(24.0);
    let (sunrise, sunset) = DAYLIGHT_HOURS;
    if !(sunrise..sunset).contains(&h) {
        return 0.0;
    }
    (PI * (h - sunrise) / (sunset - sunrise)).sin().max(0.0)
}

/// Dispatchable generator covering whatever renewables cannot.
#[derive(Debug, Clone)]
pub struct PowerPlant {
    pub id: u32,
    pub position: GeoPoint,
    pub capacity_kw: f64,
    pub current_output_kw: f64,
}

impl PowerPlant {
    pub fn new(id: u32, position: GeoPoint, capacity_kw: f64) -> Self {
        Self {
            id,
            position,
            capacity_kw,
            current_output_kw: 0.0,
        }
    }

    pub fn label(&self) -> String {
        format!("PP_{}", self.id)
    }
}

/// Solar array whose output follows the time of day.
#[derive(Debug, Clone)]
pub struct SolarPanel {
    pub id: u32,
    pub position: GeoPoint,
    pub capacity_kw: f64,
    pub current_output_kw: f64,
}

impl SolarPanel {
    pub fn new(id: u32, position: GeoPoint, capacity_kw: f64) -> Self {
        Self {
            id,
            position,
            capacity_kw,
            current_output_kw: 0.0,
        }
    }

    pub fn label(&self) -> String {
        format!("SP_{}", self.id)
    }
}

/// Aggregate balance for one tick (all kW).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PowerBalance {
    /// Sum of capacities of occupied stations.
    pub demand_kw: f64,
    /// Total solar output.
    pub renewable_kw: f64,
    /// Total plant output.
    pub plant_kw: f64,
    /// Residual demand beyond total plant capacity.
    pub unmet_kw: f64,
}

/// Recomputes panel and plant outputs from the hour and station occupancy.
///
/// Holds no state across ticks beyond the last computed outputs.
#[derive(Debug, Clone, Default)]
pub struct PowerBalanceModel {
    plants: Vec<PowerPlant>,
    panels: Vec<SolarPanel>,
    balance: PowerBalance,
}

impl PowerBalanceModel {
    pub fn new(plants: Vec<PowerPlant>, panels: Vec<SolarPanel>) -> Self {
        Self {
            plants,
            panels,
            balance: PowerBalance::default(),
        }
    }

    pub fn plants(&self) -> &[PowerPlant] {
        &self.plants
    }

    pub fn panels(&self) -> &[SolarPanel] {
        &self.panels
    }

    pub fn balance(&self) -> PowerBalance {
        self.balance
    }

    /// Updates all outputs for the given simulated hour and current occupancy.
    pub fn tick(&mut self, hour: f64, stations: &ChargingStationPool) -> PowerBalance {
        self.recompute(hour, stations.occupied_capacity_kw())
    }

    /// Updates all outputs for an explicit charging demand.
    ///
    /// The residual `max(0, demand - renewable)` is shared among plants in
    /// proportion to capacity, each clamped to its own capacity.
    pub fn recompute(&mut self, hour: f64, demand_kw: f64) -> PowerBalance {
        let fraction = solar_fraction(hour);
        let mut renewable_kw = 0.0;
        for panel in &mut self.panels {
            panel.current_output_kw = panel.capacity_kw * fraction;
            renewable_kw += panel.current_output_kw;
        }

        let residual_kw = (demand_kw - renewable_kw).max(0.0);
        let total_capacity_kw: f64 = self.plants.iter().map(|p| p.capacity_kw).sum();
        let mut plant_kw = 0.0;
        for plant in &mut self.plants {
            let share = if total_capacity_kw > 0.0 {
                residual_kw * (plant.capacity_kw / total_capacity_kw)
            } else {
                0.0
            };
            plant.current_output_kw = share.min(plant.capacity_kw).max(0.0);
            plant_kw += plant.current_output_kw;
        }

        self.balance = PowerBalance {
            demand_kw,
            renewable_kw,
            plant_kw,
            unmet_kw: (residual_kw - plant_kw).max(0.0),
        };
        self.balance
    }
}
