//! Reef log service: stores water-parameter readings per owner, validates
//! them on entry and flags values outside the owner's thresholds.
//!
//! The router is built here so integration tests can drive it without a
//! socket; `main` only wires configuration, logging and storage.

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::clock::Clock;
use crate::store::ReadingStore;

// ------------------------------------------------------------------ //
//  Shared application state                                           //
// ------------------------------------------------------------------ //

/// Shared state injected into every Axum handler via `State`.
pub struct AppState {
    pub store: Arc<dyn ReadingStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn ReadingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/parameters", get(handlers::parameters))
        // Readings
        .route(
            "/readings",
            get(handlers::list_readings).post(handlers::create_reading),
        )
        .route("/readings/validate", post(handlers::validate_reading))
        .route(
            "/readings/:date",
            get(handlers::get_reading).delete(handlers::delete_reading),
        )
        // Thresholds
        .route(
            "/thresholds",
            get(handlers::get_thresholds).put(handlers::put_thresholds),
        )
        // Dashboard
        .route("/dashboard/warnings", get(handlers::dashboard_warnings))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
