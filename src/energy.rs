//! Distance-to-energy conversion.

use crate::geo::GeoPoint;

/// Converts traveled distance into energy drawn from a vehicle's reserve.
///
/// Pure and stateless: the same distance always costs the same energy.
///
/// # Examples
///
/// ```
/// use fleet_charge_sim::energy::EnergyModel;
///
/// let model = EnergyModel::new(0.02);
/// assert!((model.energy_kwh(3.0) - 0.06).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyModel {
    /// Consumption rate in kWh per km.
    pub consumption_kwh_per_km: f64,
}

impl EnergyModel {
    pub fn new(consumption_kwh_per_km: f64) -> Self {
        Self {
            consumption_kwh_per_km,
        }
    }

    /// Energy in kWh needed to cover `distance_km`.
    pub fn energy_kwh(&self, distance_km: f64) -> f64 {
        distance_km.max(0.0) * self.consumption_kwh_per_km
    }

    /// Energy in kWh for the single hop between two points.
    pub fn hop_energy_kwh(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        self.energy_kwh(from.distance_km(to))
    }

    /// Energy in kWh to traverse a whole polyline.
    pub fn path_energy_kwh(&self, points: impl IntoIterator<Item = GeoPoint>) -> f64 {
        self.energy_kwh(path_distance_km(points))
    }
}

/// Sum of great-circle segment lengths along a polyline, in km.
pub fn path_distance_km(points: impl IntoIterator<Item = GeoPoint>) -> f64 {
    let mut total = 0.0;
    let mut prev: Option<GeoPoint> = None;
    for p in points {
        if let Some(q) = prev {
            total += q.distance_km(p);
        }
        prev = Some(p);
    }
    total
}
