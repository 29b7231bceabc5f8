//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;
use crate::twitter::{ConnectionInfo, ConnectionStats};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub connections: ConnectionHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct ConnectionHealthResponse {
    pub accounts: usize,
    pub streams: usize,
    pub event_subscribers: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub connections: ConnectionStats,
    pub accounts: Vec<ConnectionInfo>,
    pub identities: usize,
    pub event_subscribers: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.twitter.stats();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        connections: ConnectionHealthResponse {
            accounts: stats.total_connections,
            streams: stats.total_streams,
            event_subscribers: state.twitter.events().subscriber_count(),
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        connections: state.twitter.stats(),
        accounts: state.twitter.connections().list(),
        identities: state.twitter.identities().len(),
        event_subscribers: state.twitter.events().subscriber_count(),
    })
}
