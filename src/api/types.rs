//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::sim::types::{Snapshot, TickSummary};

/// Lightweight status: the last tick summary plus station availability.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub tick: u64,
    pub hour: f64,
    pub vehicles: usize,
    pub available_stations: usize,
    pub summary: TickSummary,
}

impl From<&Snapshot> for StatusResponse {
    fn from(s: &Snapshot) -> Self {
        Self {
            tick: s.tick,
            hour: s.hour,
            vehicles: s.vehicles.len(),
            available_stations: s.stations.iter().filter(|st| st.available).count(),
            summary: s.summary,
        }
    }
}

/// Optional filter for the stations endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct StationQuery {
    /// Only stations whose availability matches.
    pub available: Option<bool>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
