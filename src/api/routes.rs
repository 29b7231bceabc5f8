use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::events::twitter_events;
use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::resource::{get_resource, invoke_method, list_resources};

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                // Resources
                .route("/resources", get(list_resources))
                .route("/resources/{name}", get(get_resource))
                .route("/resources/{name}/{method}", post(invoke_method))
                // Stream events
                .route("/twitter/events", get(twitter_events))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}
