//! In-memory sandbox backend.
//!
//! Behaves like the real service from the registry's point of view:
//! credentials are checked against registered accounts, subscriptions are
//! real channels that close when destroyed, and every account action is
//! recorded. Faults can be injected per stream kind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::twitter::{Credentials, Profile, StreamParams};

use super::{
    ClientError, ClientFactory, ClientResult, StreamEvent, Subscription, SubscriptionHandle,
    TwitterClient,
};

/// Buffered events per subscription before emits start dropping
const SUBSCRIPTION_BUFFER: usize = 256;

/// Account action recorded by the sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Status { user: String, text: String },
    Follow { user: String, target: u64 },
    Unfollow { user: String, target: u64 },
    Block { user: String, target: u64 },
    Report { user: String, target: u64 },
}

struct OpenSubscription {
    owner: String,
    method: String,
    params: StreamParams,
    sender: mpsc::Sender<StreamEvent>,
}

#[derive(Default)]
struct MemoryState {
    /// access_token_key -> account
    accounts: DashMap<String, Profile>,
    subscriptions: DashMap<u64, OpenSubscription>,
    next_subscription: AtomicU64,
    next_status: AtomicU64,
    /// stream method -> error returned on open
    open_failures: DashMap<String, ClientError>,
    /// stream method -> error returned on destroy
    destroy_failures: DashMap<String, ClientError>,
    actions: Mutex<Vec<Action>>,
}

impl MemoryState {
    fn actions(&self) -> MutexGuard<'_, Vec<Action>> {
        self.actions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Shared sandbox service; clones share state
#[derive(Clone, Default)]
pub struct MemoryTwitter {
    state: Arc<MemoryState>,
}

impl MemoryTwitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `access_token_key` as the credentials of `profile`
    pub fn register_account(&self, access_token_key: impl Into<String>, profile: Profile) {
        self.state.accounts.insert(access_token_key.into(), profile);
    }

    /// Make every open of a `method` stream fail with `error`
    pub fn fail_stream_open(&self, method: impl Into<String>, error: ClientError) {
        self.state.open_failures.insert(method.into(), error);
    }

    /// Make every teardown of a `method` stream fail with `error`
    pub fn fail_stream_destroy(&self, method: impl Into<String>, error: ClientError) {
        self.state.destroy_failures.insert(method.into(), error);
    }

    pub fn clear_failures(&self) {
        self.state.open_failures.clear();
        self.state.destroy_failures.clear();
    }

    /// Number of subscriptions currently open on the service
    pub fn open_subscriptions(&self) -> usize {
        self.state.subscriptions.len()
    }

    /// Number of subscriptions currently open by `handle`
    pub fn subscriptions_for(&self, handle: &str) -> usize {
        self.state
            .subscriptions
            .iter()
            .filter(|s| s.value().owner == handle)
            .count()
    }

    /// Filter parameters of every open subscription of kind `method`
    pub fn subscription_params(&self, method: &str) -> Vec<StreamParams> {
        self.state
            .subscriptions
            .iter()
            .filter(|s| s.value().method == method)
            .map(|s| s.value().params.clone())
            .collect()
    }

    /// Push `event` to every open subscription of kind `method`.
    ///
    /// Returns how many subscriptions accepted it.
    pub fn emit(&self, method: &str, event: StreamEvent) -> usize {
        self.state
            .subscriptions
            .iter()
            .filter(|s| s.value().method == method)
            .filter(|s| s.value().sender.try_send(event.clone()).is_ok())
            .count()
    }

    /// Everything posted, followed, blocked or reported so far
    pub fn actions(&self) -> Vec<Action> {
        self.state.actions().clone()
    }

    pub fn client(&self, credentials: &Credentials) -> MemoryClient {
        MemoryClient {
            state: self.state.clone(),
            access_token_key: credentials.access_token_key.clone(),
        }
    }
}

/// [`ClientFactory`] handing out sessions on a [`MemoryTwitter`]
#[derive(Clone)]
pub struct MemoryClientFactory {
    service: MemoryTwitter,
}

impl MemoryClientFactory {
    pub fn new(service: MemoryTwitter) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &MemoryTwitter {
        &self.service
    }
}

impl ClientFactory for MemoryClientFactory {
    fn create(&self, credentials: &Credentials) -> Arc<dyn TwitterClient> {
        Arc::new(self.service.client(credentials))
    }
}

/// One authenticated session against the sandbox
pub struct MemoryClient {
    state: Arc<MemoryState>,
    access_token_key: String,
}

impl MemoryClient {
    fn account(&self) -> ClientResult<Profile> {
        self.state
            .accounts
            .get(&self.access_token_key)
            .map(|p| p.value().clone())
            .ok_or_else(|| ClientError::Unauthorized("Invalid or expired token".to_string()))
    }

    fn record(&self, action: Action) {
        self.state.actions().push(action);
    }

    fn relationship(&self, user_id: u64, action: Action) -> ClientResult<Value> {
        if user_id == 0 {
            return Err(ClientError::Api {
                message: "User not found.".to_string(),
                code: Some(50),
            });
        }
        self.record(action);
        Ok(json!({ "id": user_id }))
    }
}

#[async_trait]
impl TwitterClient for MemoryClient {
    async fn verify_credentials(&self) -> ClientResult<Profile> {
        self.account()
    }

    async fn open_stream(&self, method: &str, params: &StreamParams) -> ClientResult<Subscription> {
        let owner = self.account()?.screen_name;

        if let Some(err) = self.state.open_failures.get(method) {
            return Err(err.value().clone());
        }

        let (sender, events) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let id = self.state.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.state.subscriptions.insert(
            id,
            OpenSubscription {
                owner,
                method: method.to_string(),
                params: params.clone(),
                sender,
            },
        );

        Ok(Subscription {
            events,
            handle: Box::new(MemorySubscriptionHandle {
                state: self.state.clone(),
                id,
                method: method.to_string(),
            }),
        })
    }

    async fn update_status(&self, text: &str) -> ClientResult<Value> {
        let account = self.account()?;

        if text.is_empty() {
            return Err(ClientError::Api {
                message: "Missing required parameter: status.".to_string(),
                code: Some(170),
            });
        }

        let duplicate = self.state.actions().iter().any(|a| {
            matches!(a, Action::Status { user, text: t } if *user == account.screen_name && t == text)
        });
        if duplicate {
            return Err(ClientError::Api {
                message: "Status is a duplicate.".to_string(),
                code: Some(187),
            });
        }

        let id = self.state.next_status.fetch_add(1, Ordering::Relaxed) + 1;
        self.record(Action::Status {
            user: account.screen_name.clone(),
            text: text.to_string(),
        });

        Ok(json!({
            "id": id,
            "text": text,
            "created_at": Utc::now().to_rfc3339(),
            "user": { "id": account.id, "screen_name": account.screen_name },
        }))
    }

    async fn create_friendship(&self, user_id: u64) -> ClientResult<Value> {
        let user = self.account()?.screen_name;
        self.relationship(user_id, Action::Follow { user, target: user_id })
    }

    async fn destroy_friendship(&self, user_id: u64) -> ClientResult<Value> {
        let user = self.account()?.screen_name;
        self.relationship(user_id, Action::Unfollow { user, target: user_id })
    }

    async fn create_block(&self, user_id: u64) -> ClientResult<Value> {
        let user = self.account()?.screen_name;
        self.relationship(user_id, Action::Block { user, target: user_id })
    }

    async fn report_spam(&self, user_id: u64) -> ClientResult<Value> {
        let user = self.account()?.screen_name;
        self.relationship(user_id, Action::Report { user, target: user_id })
    }
}

struct MemorySubscriptionHandle {
    state: Arc<MemoryState>,
    id: u64,
    method: String,
}

#[async_trait]
impl SubscriptionHandle for MemorySubscriptionHandle {
    async fn destroy(&self) -> ClientResult<()> {
        if let Some(err) = self.state.destroy_failures.get(&self.method) {
            return Err(err.value().clone());
        }
        // Dropping the sender ends the event feed
        self.state.subscriptions.remove(&self.id);
        Ok(())
    }
}
