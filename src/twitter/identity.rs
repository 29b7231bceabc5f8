//! Bidirectional handle <-> numeric id index for connected users.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::types::{Identity, UserRef};

#[derive(Default)]
struct IdentityMaps {
    handle_to_id: HashMap<String, u64>,
    id_to_handle: HashMap<u64, String>,
}

/// Both directions live behind one lock, so no reader ever sees one
/// direction updated without the other.
#[derive(Default)]
pub struct IdentityIndex {
    maps: RwLock<IdentityMaps>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, IdentityMaps> {
        self.maps.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, IdentityMaps> {
        self.maps.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolve either half of a reference into the full pair
    pub fn resolve(&self, user: &UserRef) -> Option<Identity> {
        let maps = self.read();
        match user {
            UserRef::ByHandle(handle) => maps.handle_to_id.get(handle).map(|id| Identity {
                handle: handle.clone(),
                id: *id,
            }),
            UserRef::ById(id) => maps.id_to_handle.get(id).map(|handle| Identity {
                handle: handle.clone(),
                id: *id,
            }),
        }
    }

    pub fn record(&self, identity: &Identity) {
        let mut maps = self.write();
        // Drop stale pairings so the two directions stay mirror images
        if let Some(old_id) = maps.handle_to_id.remove(&identity.handle) {
            maps.id_to_handle.remove(&old_id);
        }
        if let Some(old_handle) = maps.id_to_handle.remove(&identity.id) {
            maps.handle_to_id.remove(&old_handle);
        }
        maps.handle_to_id
            .insert(identity.handle.clone(), identity.id);
        maps.id_to_handle
            .insert(identity.id, identity.handle.clone());
    }

    /// Remove the pair; returns false if it was not recorded as given
    pub fn erase(&self, identity: &Identity) -> bool {
        let mut maps = self.write();
        if maps.handle_to_id.get(&identity.handle) != Some(&identity.id) {
            return false;
        }
        maps.handle_to_id.remove(&identity.handle);
        maps.id_to_handle.remove(&identity.id);
        true
    }

    pub fn len(&self) -> usize {
        self.read().handle_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every recorded pair
    pub fn identities(&self) -> Vec<Identity> {
        self.read()
            .handle_to_id
            .iter()
            .map(|(handle, id)| Identity {
                handle: handle.clone(),
                id: *id,
            })
            .collect()
    }

    /// True when both directions agree on every pair
    pub fn is_consistent(&self) -> bool {
        let maps = self.read();
        maps.handle_to_id.len() == maps.id_to_handle.len()
            && maps
                .handle_to_id
                .iter()
                .all(|(handle, id)| maps.id_to_handle.get(id) == Some(handle))
    }
}
