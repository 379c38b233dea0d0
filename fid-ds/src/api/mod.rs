//! REST API for the dispatch service
//!
//! Exposes the two core operations (inspector search, mobilization) plus
//! administrative inspector creation and a health check.

pub mod handlers;

use crate::search::DirectoryService;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use fid_common::clock::Clock;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub pool: SqlitePool,
    pub clock: Arc<dyn Clock>,
    pub directory: Arc<DirectoryService>,
    pub port: u16,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))
        // API v1 routes
        .nest(
            "/api/v1",
            Router::new()
                .route("/inspectors", post(handlers::create_inspector))
                .route("/inspectors/search", post(handlers::search_inspectors))
                .route("/inspectors/:inspector_id/mobilize", post(handlers::mobilize_inspector)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Health check endpoint
async fn health_check(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "fid-ds",
        "version": env!("CARGO_PKG_VERSION"),
        "port": ctx.port,
    }))
}
