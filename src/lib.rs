// Shared components
pub mod config;
pub mod error;
pub mod metrics;

// Domain layer
pub mod client;
pub mod resource;
pub mod twitter;

// Application layer
pub mod api;
pub mod server;
