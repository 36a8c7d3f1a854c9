//! Request handlers for the API endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{ErrorResponse, StationQuery, StatusResponse};
use crate::fleet::VehicleId;
use crate::sim::types::{Snapshot, StationView, VehicleView};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// `GET /snapshot` → 200 + `Snapshot` JSON
pub async fn get_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.snapshot())
}

/// `GET /status` → 200 + `StatusResponse` JSON
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::from(&state.snapshot()))
}

/// Returns one vehicle.
///
/// `GET /vehicles/{id}` → 200 + `VehicleView` JSON
/// `GET /vehicles/999` → 404 + `ErrorResponse`
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<VehicleView>, ApiError> {
    let snap = state.snapshot();
    snap.vehicle(VehicleId(id)).cloned().map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no vehicle {}", VehicleId(id)),
            }),
        )
    })
}

/// Returns stations, optionally filtered by availability.
///
/// `GET /stations` → all stations
/// `GET /stations?available=true` → free stations only
pub async fn get_stations(
    State(state): State<AppState>,
    Query(query): Query<StationQuery>,
) -> Json<Vec<StationView>> {
    let stations = state
        .snapshot()
        .stations
        .into_iter()
        .filter(|s| query.available.is_none_or(|want| s.available == want))
        .collect();
    Json(stations)
}

/// Advances one tick.
///
/// `POST /step` → 200 + the new `Snapshot` JSON
pub async fn post_step(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.step())
}
