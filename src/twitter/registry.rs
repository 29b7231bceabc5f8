//! Connection registry: one entry per connected account, keyed by handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::client::TwitterClient;

use super::stream::StreamEntry;
use super::types::{Identity, Profile, StreamId, StreamInfo};

/// An authenticated session and the streams opened on it
pub struct ConnectionEntry {
    client: Arc<dyn TwitterClient>,
    profile: Profile,
    streams: DashMap<StreamId, Arc<StreamEntry>>,
    connected_at: DateTime<Utc>,
    /// Shared by stream opens, exclusive for disconnect
    lifecycle: RwLock<()>,
    closing: AtomicBool,
}

impl ConnectionEntry {
    pub(crate) fn new(client: Arc<dyn TwitterClient>, profile: Profile) -> Self {
        Self {
            client,
            profile,
            streams: DashMap::new(),
            connected_at: Utc::now(),
            lifecycle: RwLock::new(()),
            closing: AtomicBool::new(false),
        }
    }

    pub fn handle(&self) -> &str {
        &self.profile.screen_name
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn identity(&self) -> Identity {
        self.profile.identity()
    }

    pub fn client(&self) -> &dyn TwitterClient {
        self.client.as_ref()
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn stream(&self, stream_id: &str) -> Option<Arc<StreamEntry>> {
        self.streams.get(stream_id).map(|s| s.value().clone())
    }

    pub fn stream_ids(&self) -> Vec<StreamId> {
        self.streams.iter().map(|s| s.key().clone()).collect()
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn streams(&self) -> Vec<StreamInfo> {
        self.streams.iter().map(|s| s.value().info()).collect()
    }

    pub(crate) fn insert_stream(&self, stream: Arc<StreamEntry>) {
        self.streams.insert(stream.id().to_string(), stream);
    }

    pub(crate) fn remove_stream(&self, stream_id: &str) -> Option<Arc<StreamEntry>> {
        self.streams.remove(stream_id).map(|(_, s)| s)
    }

    /// Drain every stream entry without tearing anything down
    pub(crate) fn take_streams(&self) -> Vec<Arc<StreamEntry>> {
        let ids = self.stream_ids();
        ids.iter().filter_map(|id| self.remove_stream(id)).collect()
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    pub(crate) fn set_closing(&self, closing: bool) {
        self.closing.store(closing, Ordering::Release);
    }

    pub(crate) async fn open_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.lifecycle.read().await
    }

    pub(crate) async fn close_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.lifecycle.write().await
    }
}

/// Registry statistics
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub total_streams: usize,
    pub streams_per_user: HashMap<String, usize>,
}

/// Summary of one connected account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub screen_name: String,
    pub id: u64,
    pub connected_at: DateTime<Utc>,
    pub streams: Vec<StreamId>,
}

/// All connected accounts, keyed by handle
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<String, Arc<ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the handle is already connected
    pub(crate) fn insert(&self, entry: Arc<ConnectionEntry>) -> bool {
        match self.connections.entry(entry.handle().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                true
            }
        }
    }

    pub fn get(&self, handle: &str) -> Option<Arc<ConnectionEntry>> {
        self.connections.get(handle).map(|c| c.value().clone())
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.connections.contains_key(handle)
    }

    /// True while `entry` is the one registered under its handle
    pub fn is_current(&self, entry: &Arc<ConnectionEntry>) -> bool {
        self.connections
            .get(entry.handle())
            .is_some_and(|current| Arc::ptr_eq(current.value(), entry))
    }

    /// Remove `entry`; refuses while it still owns streams or when the
    /// handle has been taken over by a newer connection
    pub(crate) fn remove(&self, entry: &Arc<ConnectionEntry>) -> bool {
        self.connections
            .remove_if(entry.handle(), |_, current| {
                Arc::ptr_eq(current, entry) && current.stream_count() == 0
            })
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn handles(&self) -> Vec<String> {
        self.connections.iter().map(|c| c.key().clone()).collect()
    }

    pub fn list(&self) -> Vec<ConnectionInfo> {
        self.connections
            .iter()
            .map(|c| {
                let entry = c.value();
                ConnectionInfo {
                    screen_name: entry.handle().to_string(),
                    id: entry.profile().id,
                    connected_at: entry.connected_at(),
                    streams: entry.stream_ids(),
                }
            })
            .collect()
    }

    pub fn stats(&self) -> ConnectionStats {
        let streams_per_user: HashMap<String, usize> = self
            .connections
            .iter()
            .map(|c| (c.key().clone(), c.value().stream_count()))
            .collect();

        ConnectionStats {
            total_connections: streams_per_user.len(),
            total_streams: streams_per_user.values().sum(),
            streams_per_user,
        }
    }
}
