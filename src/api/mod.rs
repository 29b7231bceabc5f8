//! API layer - HTTP endpoint handlers organized by domain.

mod events;
mod health;
mod metrics;
mod resource;
mod routes;

pub use events::twitter_events;
pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use resource::{get_resource, invoke_method, list_resources};
pub use routes::api_routes;
