//! Fleet and grid KPIs aggregated over a run.

use std::fmt;

use serde::Serialize;

use super::types::TickSummary;

/// Aggregate key performance indicators for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiReport {
    /// Ticks observed.
    pub ticks: u64,
    /// Vehicles stranded at the end of the run.
    pub stranded_vehicles: usize,
    /// Stations reserved over the run.
    pub reservations: usize,
    /// Charging sessions completed over the run.
    pub charging_sessions_completed: usize,
    /// Energy delivered by stations (kWh).
    pub energy_delivered_kwh: f64,
    /// Peak occupied-station capacity (kW).
    pub peak_charging_demand_kw: f64,
    /// Peak combined plant output (kW).
    pub peak_plant_output_kw: f64,
    /// Solar energy produced (kWh).
    pub renewable_energy_kwh: f64,
    /// Demand above total plant capacity (kWh).
    pub unmet_energy_kwh: f64,
    /// Mean fleet state of charge at the end of the run (0.0 to 1.0).
    pub final_mean_state_of_charge: f64,
}

impl KpiReport {
    /// Computes all KPIs post-hoc from a run's tick summaries.
    ///
    /// # Arguments
    ///
    /// * `summaries` - Tick summaries in order
    /// * `tick_hours` - Simulated hours per tick
    pub fn from_summaries(summaries: &[TickSummary], tick_hours: f64) -> Self {
        let mut tracker = KpiTracker::new(tick_hours);
        for s in summaries {
            tracker.observe(s);
        }
        tracker.report()
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Ticks:                 {}", self.ticks)?;
        writeln!(f, "Stranded vehicles:     {}", self.stranded_vehicles)?;
        writeln!(
            f,
            "Charging sessions:     {} completed / {} reserved",
            self.charging_sessions_completed, self.reservations
        )?;
        writeln!(f, "Energy delivered:      {:.2} kWh", self.energy_delivered_kwh)?;
        writeln!(f, "Peak charging demand:  {:.1} kW", self.peak_charging_demand_kw)?;
        writeln!(f, "Peak plant output:     {:.1} kW", self.peak_plant_output_kw)?;
        writeln!(f, "Renewable energy:      {:.2} kWh", self.renewable_energy_kwh)?;
        if self.unmet_energy_kwh > 0.0 {
            writeln!(f, "Unmet demand:          {:.2} kWh", self.unmet_energy_kwh)?;
        }
        write!(
            f,
            "Final mean SoC:        {:.1}%",
            self.final_mean_state_of_charge * 100.0
        )
    }
}

/// Incremental KPI accumulator for open-ended runs.
#[derive(Debug, Clone)]
pub struct KpiTracker {
    tick_hours: f64,
    report: KpiReport,
}

impl KpiTracker {
    pub fn new(tick_hours: f64) -> Self {
        Self {
            tick_hours,
            report: KpiReport::default(),
        }
    }

    pub fn observe(&mut self, s: &TickSummary) {
        let r = &mut self.report;
        r.ticks += 1;
        r.stranded_vehicles = s.stranded;
        r.reservations += s.reserved;
        r.charging_sessions_completed += s.completed;
        r.energy_delivered_kwh += s.delivered_kwh;
        r.peak_charging_demand_kw = r.peak_charging_demand_kw.max(s.balance.demand_kw);
        r.peak_plant_output_kw = r.peak_plant_output_kw.max(s.balance.plant_kw);
        r.renewable_energy_kwh += s.balance.renewable_kw * self.tick_hours;
        r.unmet_energy_kwh += s.balance.unmet_kw * self.tick_hours;
        r.final_mean_state_of_charge = s.mean_state_of_charge;
    }

    pub fn report(&self) -> KpiReport {
        self.report.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PowerBalance;

    fn summary(demand: f64, solar: f64, plant: f64) -> TickSummary {
        TickSummary {
            balance: PowerBalance {
                demand_kw: demand,
                renewable_kw: solar,
                plant_kw: plant,
                unmet_kw: 0.0,
            },
            ..TickSummary::default()
        }
    }

    #[test]
    fn peaks_and_energy() {
        let summaries = [
            summary(50.0, 60.0, 0.0),
            summary(150.0, 60.0, 90.0),
            summary(100.0, 30.0, 70.0),
        ];
        let kpi = KpiReport::from_summaries(&summaries, 0.5);
        assert_eq!(kpi.ticks, 3);
        assert_eq!(kpi.peak_charging_demand_kw, 150.0);
        assert_eq!(kpi.peak_plant_output_kw, 90.0);
        assert!((kpi.renewable_energy_kwh - 75.0).abs() < 1e-9);
    }

    #[test]
    fn session_counts_accumulate_and_stranding_is_latest() {
        let mut a = TickSummary::default();
        a.reserved = 2;
        a.stranded = 1;
        a.delivered_kwh = 0.8;
        let mut b = TickSummary::default();
        b.completed = 1;
        b.stranded = 2;
        b.delivered_kwh = 0.8;
        b.mean_state_of_charge = 0.65;

        let kpi = KpiReport::from_summaries(&[a, b], 1.0 / 60.0);
        assert_eq!(kpi.reservations, 2);
        assert_eq!(kpi.charging_sessions_completed, 1);
        assert_eq!(kpi.stranded_vehicles, 2);
        assert!((kpi.energy_delivered_kwh - 1.6).abs() < 1e-12);
        assert_eq!(kpi.final_mean_state_of_charge, 0.65);
    }

    #[test]
    fn empty_run() {
        let kpi = KpiReport::from_summaries(&[], 1.0);
        assert_eq!(kpi, KpiReport::default());
        assert!(kpi.to_string().starts_with("--- KPI Report ---"));
    }
}
