//! Route definitions for the registry API

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::handlers::*;
use crate::websocket::websocket_handler;

// Registry configuration routes
pub fn registry_routes() -> Router<AppState> {
    Router::new()
        .route("/api/registry", get(get_registry))
        .route("/api/config/consensus", put(update_consensus))
        .route("/api/config/signatures", put(update_signatures))
        .route("/api/config/cooldown", put(update_cooldown))
        .route("/api/admins", post(add_admin))
}

// Oracle membership routes
pub fn oracle_routes() -> Router<AppState> {
    Router::new()
        .route("/api/oracles", post(register_oracle).get(list_oracles))
        .route("/api/oracles/:id", get(get_oracle))
        .route("/api/oracles/:id/deregister", post(deregister_oracle))
}

// Event and attestation routes
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/api/events/:id", get(get_event))
        .route("/api/events/:id/schedule", post(schedule_event))
        .route("/api/events/:id/attestations", post(submit_attestation))
        .route("/api/events/:id/consensus", get(check_consensus))
        .route("/api/events/:id/override", post(emergency_override))
}

// Audit log and live stream
pub fn audit_routes() -> Router<AppState> {
    Router::new()
        .route("/api/audit", get(audit_log))
        .route("/ws", get(websocket_handler))
}

/// Full application router with state attached.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(registry_routes())
        .merge(oracle_routes())
        .merge(event_routes())
        .merge(audit_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
