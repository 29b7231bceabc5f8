//! Client backend factory

use std::sync::Arc;

use crate::config::TwitterConfig;
use crate::twitter::Profile;

use super::memory::{MemoryClientFactory, MemoryTwitter};
use super::ClientFactory;

/// Client backend selected by `twitter.backend`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientBackendType {
    /// In-process sandbox service
    Memory,
}

impl ClientBackendType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "memory" | "sandbox" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Create a client factory based on configuration.
///
/// - `"memory"` (default): a [`MemoryClientFactory`] seeded with
///   `twitter.sandbox_accounts`
///
/// Unknown backends fall back to memory with a warning.
pub fn create_client_factory(settings: &TwitterConfig) -> Arc<dyn ClientFactory> {
    let backend = ClientBackendType::parse(&settings.backend).unwrap_or_else(|| {
        tracing::warn!(
            backend = %settings.backend,
            "Unknown client backend requested, falling back to memory"
        );
        ClientBackendType::Memory
    });

    match backend {
        ClientBackendType::Memory => {
            let service = MemoryTwitter::new();
            for account in &settings.sandbox_accounts {
                let mut profile = Profile::new(account.id, account.screen_name.clone());
                profile.name = account.name.clone();
                service.register_account(account.access_token_key.clone(), profile);
            }
            tracing::info!(
                backend = "memory",
                accounts = settings.sandbox_accounts.len(),
                "Creating sandbox client backend"
            );
            Arc::new(MemoryClientFactory::new(service))
        }
    }
}
