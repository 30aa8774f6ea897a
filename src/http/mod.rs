pub mod remote;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Interface;
use crate::http::state::AppState;

/// Every command lives under this path prefix.
pub const REMOTE_PREFIX: &str = "/ifttt/remote/";

/// Build the gateway router for one interface shape. JSON and query
/// deployments are never mixed, so only one route is mounted.
pub fn build_router(state: AppState, interface: Interface) -> Router {
    let command_route = match interface {
        Interface::Json => post(remote::remote_json),
        Interface::Query => get(remote::remote_query),
    };
    Router::new()
        .route("/ifttt/remote/{command}", command_route)
        .fallback(remote::invalid_path)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
