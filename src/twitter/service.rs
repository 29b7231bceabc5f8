//! Connection and stream lifecycle for connected Twitter accounts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;

use crate::client::{ClientFactory, ClientResult};
use crate::config::TwitterConfig;
use crate::metrics::OperationMetrics;

use super::error::{TwitterError, TwitterResult};
use super::handler::{EventHub, StreamHandler};
use super::identity::IdentityIndex;
use super::registry::{ConnectionEntry, ConnectionRegistry, ConnectionStats};
use super::stream::{confirm, open_stream};
use super::text::{is_valid_length, tweet_length, MAX_TWEET_LENGTH};
use super::types::{Credentials, Identity, Profile, StreamInfo, StreamSpec, Tweet, UserRef};

/// Owns the identity index and the connection registry.
///
/// Share it behind an `Arc`; every operation takes `&self`.
pub struct TwitterService {
    factory: Arc<dyn ClientFactory>,
    identities: IdentityIndex,
    connections: ConnectionRegistry,
    hub: EventHub,
    handler: Arc<dyn StreamHandler>,
    confirmation_timeout: Option<Duration>,
}

impl TwitterService {
    pub fn new(factory: Arc<dyn ClientFactory>, config: &TwitterConfig) -> Self {
        let hub = EventHub::new(config.event_buffer);
        Self {
            factory,
            identities: IdentityIndex::new(),
            connections: ConnectionRegistry::new(),
            handler: Arc::new(hub.clone()),
            hub,
            confirmation_timeout: config.confirmation_timeout(),
        }
    }

    /// Route stream events and received tweets to `handler` instead of the
    /// event hub
    pub fn with_handler(mut self, handler: Arc<dyn StreamHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn events(&self) -> &EventHub {
        &self.hub
    }

    pub fn identities(&self) -> &IdentityIndex {
        &self.identities
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    pub fn stats(&self) -> ConnectionStats {
        self.connections.stats()
    }

    fn resolve(&self, user: &UserRef) -> TwitterResult<Identity> {
        self.identities
            .resolve(user)
            .ok_or_else(|| TwitterError::ConnectionNotFound(user.to_string()))
    }

    fn connection(&self, user: &UserRef) -> TwitterResult<Arc<ConnectionEntry>> {
        let identity = self.resolve(user)?;
        self.connections
            .get(&identity.handle)
            .ok_or_else(|| TwitterError::ConnectionNotFound(user.to_string()))
    }

    async fn call<T, F>(&self, operation: &'static str, fut: F) -> TwitterResult<T>
    where
        F: std::future::Future<Output = ClientResult<T>>,
    {
        confirm(operation, self.confirmation_timeout, fut).await
    }

    /// Verify credentials, open `streams`, then publish the connection.
    ///
    /// Nothing is published unless every stream opened. On failure, streams
    /// that did open are torn down again.
    #[tracing::instrument(
        name = "twitter.connect",
        skip(self, credentials, streams),
        fields(streams = streams.len())
    )]
    pub async fn connect(
        &self,
        credentials: &Credentials,
        streams: Vec<StreamSpec>,
    ) -> TwitterResult<Profile> {
        let start = Instant::now();
        let result = self.connect_inner(credentials, streams).await;
        OperationMetrics::record("connect", result.is_ok(), start.elapsed());
        result
    }

    async fn connect_inner(
        &self,
        credentials: &Credentials,
        streams: Vec<StreamSpec>,
    ) -> TwitterResult<Profile> {
        let client = self.factory.create(credentials);
        let profile = self
            .call("credential verification", client.verify_credentials())
            .await?;
        let identity = profile.identity();

        self.check_not_connected(&identity)?;

        let entry = Arc::new(ConnectionEntry::new(client, profile.clone()));
        self.open_initial_streams(&entry, streams).await?;

        // Re-check: another connect may have published while streams opened
        if let Err(e) = self.check_not_connected(&identity) {
            self.rollback(&entry).await;
            return Err(e);
        }
        if !self.connections.insert(entry.clone()) {
            self.rollback(&entry).await;
            return Err(TwitterError::AlreadyConnected(identity.handle));
        }
        self.identities.record(&identity);

        tracing::info!(
            user = %identity.handle,
            user_id = identity.id,
            streams = entry.stream_count(),
            "Connected"
        );

        Ok(profile)
    }

    /// Refuse when the handle, or the numeric id under another handle, still
    /// owns a live connection
    fn check_not_connected(&self, identity: &Identity) -> TwitterResult<()> {
        if self.connections.contains(&identity.handle) {
            return Err(TwitterError::AlreadyConnected(identity.handle.clone()));
        }
        if let Some(existing) = self.identities.resolve(&UserRef::id(identity.id)) {
            if existing.handle != identity.handle && self.connections.contains(&existing.handle) {
                tracing::warn!(
                    user = %identity.handle,
                    user_id = identity.id,
                    connected_as = %existing.handle,
                    "Account id already connected under another handle"
                );
                return Err(TwitterError::AlreadyConnected(existing.handle));
            }
        }
        Ok(())
    }

    /// Open every requested stream on the unpublished entry.
    ///
    /// The first failure cancels opens still in flight.
    async fn open_initial_streams(
        &self,
        entry: &Arc<ConnectionEntry>,
        streams: Vec<StreamSpec>,
    ) -> TwitterResult<()> {
        if streams.is_empty() {
            return Ok(());
        }

        let mut pending: FuturesUnordered<_> = streams
            .into_iter()
            .map(|spec| {
                let method = spec.method.clone();
                let handler = self.handler.clone();
                async move {
                    let result = open_stream(
                        entry.client(),
                        entry.handle(),
                        spec,
                        handler,
                        self.confirmation_timeout,
                    )
                    .await;
                    (method, result)
                }
            })
            .collect();

        let mut failure = None;
        while let Some((method, result)) = pending.next().await {
            match result {
                Ok(stream) => entry.insert_stream(stream),
                Err(err) => {
                    failure = Some((method, err));
                    break;
                }
            }
        }
        drop(pending);

        let Some((method, source)) = failure else {
            return Ok(());
        };

        tracing::warn!(
            user = %entry.handle(),
            method = %method,
            error = %source,
            opened = entry.stream_count(),
            "Stream failed to open during connect, rolling back"
        );
        self.rollback(entry).await;

        Err(TwitterError::PartialFailure {
            operation: "connect",
            failed: vec![method],
            source: Box::new(source),
        })
    }

    /// Best-effort teardown of an unpublished entry's streams
    async fn rollback(&self, entry: &ConnectionEntry) {
        let streams = entry.take_streams();
        let results = join_all(
            streams
                .iter()
                .map(|stream| stream.destroy(self.confirmation_timeout)),
        )
        .await;

        for (stream, result) in streams.iter().zip(results) {
            if let Err(e) = result {
                tracing::error!(
                    stream_id = %stream.id(),
                    user = %entry.handle(),
                    error = %e,
                    "Failed to tear down stream during rollback"
                );
            }
        }
    }

    /// Tear down every stream, then forget the connection.
    ///
    /// All streams are attempted even after a failure. Streams whose
    /// teardown failed stay registered and can be removed again; the
    /// connection stays registered with them.
    #[tracing::instrument(name = "twitter.disconnect", skip(self), fields(user = %user))]
    pub async fn disconnect(&self, user: &UserRef) -> TwitterResult<bool> {
        let start = Instant::now();
        let result = self.disconnect_inner(user).await;
        OperationMetrics::record("disconnect", result.is_ok(), start.elapsed());
        result
    }

    async fn disconnect_inner(&self, user: &UserRef) -> TwitterResult<bool> {
        let entry = self.connection(user)?;

        let _gate = entry.close_gate().await;
        if !self.connections.is_current(&entry) {
            // Another disconnect finished first
            return Err(TwitterError::ConnectionNotFound(user.to_string()));
        }
        entry.set_closing(true);

        let stream_ids = entry.stream_ids();
        let results = join_all(stream_ids.iter().map(|id| self.close_stream(&entry, id))).await;

        let mut failed = Vec::new();
        let mut first_error = None;
        for (stream_id, result) in stream_ids.into_iter().zip(results) {
            match result {
                Ok(()) | Err(TwitterError::StreamNotFound { .. }) => {}
                Err(e) => {
                    failed.push(stream_id);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(source) = first_error {
            entry.set_closing(false);
            tracing::warn!(
                user = %entry.handle(),
                failed = ?failed,
                error = %source,
                "Disconnect left streams open"
            );
            return Err(TwitterError::PartialFailure {
                operation: "disconnect",
                failed,
                source: Box::new(source),
            });
        }

        if !self.connections.remove(&entry) {
            // A concurrent removeStream still owns a stream of this entry
            entry.set_closing(false);
            return Err(TwitterError::PartialFailure {
                operation: "disconnect",
                failed: entry.stream_ids(),
                source: Box::new(TwitterError::ExternalService {
                    message: "stream teardown still in progress".to_string(),
                    code: None,
                }),
            });
        }
        let identity = entry.identity();
        // A reconnect may already have republished the same pair
        if !self.connections.contains(&identity.handle) {
            self.identities.erase(&identity);
        }

        tracing::info!(user = %identity.handle, user_id = identity.id, "Disconnected");
        Ok(true)
    }

    /// Disconnect every account; returns how many disconnected cleanly
    pub async fn disconnect_all(&self) -> usize {
        let users: Vec<UserRef> = self
            .connections
            .handles()
            .into_iter()
            .map(UserRef::handle)
            .collect();
        let results = join_all(users.iter().map(|user| self.disconnect(user))).await;

        let mut disconnected = 0;
        for (handle, result) in users.iter().zip(results) {
            match result {
                Ok(_) => disconnected += 1,
                Err(e) => tracing::error!(user = %handle, error = %e, "Failed to disconnect"),
            }
        }
        disconnected
    }

    /// Open a stream on the user's connection and start routing its events
    #[tracing::instrument(
        name = "twitter.add_stream",
        skip(self, spec),
        fields(user = %user, method = %spec.method)
    )]
    pub async fn add_stream(&self, user: &UserRef, spec: StreamSpec) -> TwitterResult<StreamInfo> {
        let start = Instant::now();
        let result = self.add_stream_inner(user, spec).await;
        OperationMetrics::record("add_stream", result.is_ok(), start.elapsed());
        result
    }

    async fn add_stream_inner(&self, user: &UserRef, spec: StreamSpec) -> TwitterResult<StreamInfo> {
        let entry = self.connection(user)?;

        let _gate = entry.open_gate().await;
        if entry.is_closing() {
            return Err(TwitterError::ConnectionNotFound(user.to_string()));
        }

        let stream = open_stream(
            entry.client(),
            entry.handle(),
            spec,
            self.handler.clone(),
            self.confirmation_timeout,
        )
        .await?;
        let info = stream.info();
        entry.insert_stream(stream);

        Ok(info)
    }

    pub fn get_stream(&self, user: &UserRef, stream_id: &str) -> TwitterResult<StreamInfo> {
        let entry = self.connection(user)?;
        entry
            .stream(stream_id)
            .map(|s| s.info())
            .ok_or_else(|| TwitterError::StreamNotFound {
                user: entry.handle().to_string(),
                stream_id: stream_id.to_string(),
            })
    }

    /// Streams currently open for the user
    pub fn list_streams(&self, user: &UserRef) -> TwitterResult<Vec<StreamInfo>> {
        Ok(self.connection(user)?.streams())
    }

    /// Close a stream; the entry goes away only once the service confirmed
    #[tracing::instrument(name = "twitter.remove_stream", skip(self), fields(user = %user))]
    pub async fn remove_stream(&self, user: &UserRef, stream_id: &str) -> TwitterResult<bool> {
        let start = Instant::now();
        let result = match self.connection(user) {
            Ok(entry) => self.close_stream(&entry, stream_id).await.map(|_| true),
            Err(e) => Err(e),
        };
        OperationMetrics::record("remove_stream", result.is_ok(), start.elapsed());
        result
    }

    async fn close_stream(&self, entry: &ConnectionEntry, stream_id: &str) -> TwitterResult<()> {
        let not_found = || TwitterError::StreamNotFound {
            user: entry.handle().to_string(),
            stream_id: stream_id.to_string(),
        };

        let stream = entry.stream(stream_id).ok_or_else(not_found)?;
        if !stream.claim() {
            return Err(not_found());
        }

        match stream.destroy(self.confirmation_timeout).await {
            Ok(()) => {
                entry.remove_stream(stream_id);
                tracing::info!(stream_id = %stream_id, user = %entry.handle(), "Stream closed");
                Ok(())
            }
            Err(e) => {
                stream.release();
                tracing::warn!(
                    stream_id = %stream_id,
                    user = %entry.handle(),
                    error = %e,
                    "Stream teardown failed"
                );
                Err(e)
            }
        }
    }

    /// Post a status for the user
    #[tracing::instrument(name = "twitter.send", skip(self, message), fields(user = %user))]
    pub async fn send(&self, user: &UserRef, message: &str) -> TwitterResult<Value> {
        let entry = self.connection(user)?;

        let length = tweet_length(message);
        if !is_valid_length(message) {
            tracing::warn!(length, max = MAX_TWEET_LENGTH, "Tweet length outside 1..=max");
        }

        let start = Instant::now();
        let result = self
            .call("status update", entry.client().update_status(message))
            .await;
        OperationMetrics::record("send", result.is_ok(), start.elapsed());

        let result = result?;
        tracing::info!(user = %entry.handle(), length, "Sent tweet");
        Ok(result)
    }

    /// Pass-through hook for tweets entering the system
    pub fn receive(&self, tweet: Tweet) -> Tweet {
        let tweet = tweet.normalize();
        self.handler.on_receive(tweet.clone());
        tweet
    }

    pub async fn follow(&self, user: &UserRef, target: u64) -> TwitterResult<Value> {
        let entry = self.connection(user)?;
        let start = Instant::now();
        let result = self
            .call("follow", entry.client().create_friendship(target))
            .await;
        OperationMetrics::record("follow", result.is_ok(), start.elapsed());

        let result = result?;
        tracing::info!(user = %entry.handle(), target, "Followed");
        Ok(result)
    }

    pub async fn unfollow(&self, user: &UserRef, target: u64) -> TwitterResult<Value> {
        let entry = self.connection(user)?;
        let start = Instant::now();
        let result = self
            .call("unfollow", entry.client().destroy_friendship(target))
            .await;
        OperationMetrics::record("unfollow", result.is_ok(), start.elapsed());

        let result = result?;
        tracing::info!(user = %entry.handle(), target, "Unfollowed");
        Ok(result)
    }

    pub async fn block(&self, user: &UserRef, target: u64) -> TwitterResult<Value> {
        let entry = self.connection(user)?;
        let start = Instant::now();
        let result = self.call("block", entry.client().create_block(target)).await;
        OperationMetrics::record("block", result.is_ok(), start.elapsed());

        let result = result?;
        tracing::info!(user = %entry.handle(), target, "Blocked");
        Ok(result)
    }

    pub async fn report(&self, user: &UserRef, target: u64) -> TwitterResult<Value> {
        let entry = self.connection(user)?;
        let start = Instant::now();
        let result = self.call("report", entry.client().report_spam(target)).await;
        OperationMetrics::record("report", result.is_ok(), start.elapsed());

        let result = result?;
        tracing::warn!(user = %entry.handle(), target, "Reported");
        Ok(result)
    }

    pub fn tweet_length(&self, message: &str) -> usize {
        tweet_length(message)
    }
}
