/// Logical tick clock and simulated hour of day.
pub mod clock;
pub mod engine;
pub mod kpi;
/// Lock-protected handle for concurrent readers.
pub mod shared;
pub mod types;

pub use engine::{Simulation, World};
pub use kpi::{KpiReport, KpiTracker};
pub use shared::SharedSimulation;
pub use types::{PowerSourceKind, PowerSourceView, Snapshot, StationView, TickSummary, VehicleView};
