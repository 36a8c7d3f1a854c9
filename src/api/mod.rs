//! REST API over a live simulation.
//!
//! - `GET /snapshot` full current state
//! - `GET /status` last tick summary
//! - `GET /vehicles/{id}` one vehicle
//! - `GET /stations` stations, optionally `?available=true|false`
//! - `POST /step` advance one tick

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::network::RoadGraph;
use crate::sim::SharedSimulation;

pub use types::{ErrorResponse, StationQuery, StatusResponse};

/// State shared by all handlers: the lock-protected simulation.
pub type AppState = SharedSimulation<RoadGraph>;

/// Builds the axum router with all API routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/snapshot", get(handlers::get_snapshot))
        .route("/status", get(handlers::get_status))
        .route("/vehicles/{id}", get(handlers::get_vehicle))
        .route("/stations", get(handlers::get_stations))
        .route("/step", post(handlers::post_step))
        .with_state(state)
}

/// Steps `state` every `every` until the task is dropped.
pub fn spawn_stepper(state: AppState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            state.step();
        }
    })
}

/// Binds to `addr`, starts the periodic stepper and serves the API.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: AppState, addr: SocketAddr, tick_interval: Duration) -> io::Result<()> {
    let stepper = spawn_stepper(state.clone(), tick_interval);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, ?tick_interval, "API server listening");
    let result = axum::serve(listener, app).await;
    stepper.abort();
    result
}
