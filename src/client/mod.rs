//! Boundary to the social-media service.
//!
//! The registry never talks to the network itself. It consumes the
//! capabilities below; every backend (the in-memory sandbox included)
//! implements them.

mod factory;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::twitter::{Credentials, LimitNotice, Profile, StreamParams};

pub use factory::{create_client_factory, ClientBackendType};
pub use memory::{MemoryClientFactory, MemoryTwitter};

/// Errors reported by a client backend.
///
/// Backends report whatever shape the service gives them; the registry
/// normalizes these into [`crate::twitter::TwitterError`].
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The service answered with an error
    #[error("API error: {message}")]
    Api { message: String, code: Option<i64> },

    /// The request never completed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with something unreadable
    #[error("Malformed response: {0}")]
    Malformed(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Raw event emitted by an open subscription
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A status payload, as the service sent it
    Data(Value),
    /// Rate-limit notice
    Limit(LimitNotice),
    /// Error reported on the stream, possibly with a separate code
    Error { message: String, code: Option<i64> },
}

/// Teardown side of an open subscription
#[async_trait]
pub trait SubscriptionHandle: Send + Sync {
    /// Ask the service to close the subscription; resolves once it is closed.
    async fn destroy(&self) -> ClientResult<()>;
}

/// An open subscription: its event feed plus the handle that closes it
pub struct Subscription {
    pub events: mpsc::Receiver<StreamEvent>,
    pub handle: Box<dyn SubscriptionHandle>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Authenticated session with the service
#[async_trait]
pub trait TwitterClient: Send + Sync {
    async fn verify_credentials(&self) -> ClientResult<Profile>;

    /// Open a subscription of kind `method` filtered by `params`.
    async fn open_stream(&self, method: &str, params: &StreamParams) -> ClientResult<Subscription>;

    async fn update_status(&self, text: &str) -> ClientResult<Value>;

    async fn create_friendship(&self, user_id: u64) -> ClientResult<Value>;

    async fn destroy_friendship(&self, user_id: u64) -> ClientResult<Value>;

    async fn create_block(&self, user_id: u64) -> ClientResult<Value>;

    async fn report_spam(&self, user_id: u64) -> ClientResult<Value>;
}

/// Builds client sessions from credentials
pub trait ClientFactory: Send + Sync {
    fn create(&self, credentials: &Credentials) -> Arc<dyn TwitterClient>;
}
