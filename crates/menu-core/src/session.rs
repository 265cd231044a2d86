//! One client's view of the shared menu.
//!
//! A [`MenuSession`] owns the store, the local cache, the admin gate and (while open)
//! a subscription on the remote record. Remote updates are applied one at a time,
//! to completion, in the order the subscription delivers them.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::admin::{AdminGate, GateState};
use crate::cache::LocalCache;
use crate::channel::{RemoteSyncChannel, RemoteUpdate, Subscription};
use crate::error::{AuthError, EditError, SessionError, SyncError};
use crate::model::MenuTree;
use crate::ops::{self, Direction, Tag};
use crate::store::MenuStore;

/// What applying one remote update did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The store now holds the remote tree. `discarded_edits` is set when unsaved
    /// admin edits were overwritten.
    Replaced {
        sections: usize,
        discarded_edits: bool,
    },
    /// The remote was empty and this session wrote the default tree to it.
    Seeded,
    /// The remote was empty but this session already attempted its seed write.
    SeedSkipped,
    SeedFailed(String),
    /// The remote value did not decode or validate; the store was left alone.
    Rejected(String),
}

pub struct MenuSession {
    remote: Arc<dyn RemoteSyncChannel>,
    cache: LocalCache,
    store: MenuStore,
    gate: AdminGate,
    default_tree: MenuTree,
    seed_attempted: bool,
    subscription: Option<Subscription>,
}

impl MenuSession {
    /// Starts from the cached tree when there is one, the default tree otherwise.
    pub fn new(
        remote: Arc<dyn RemoteSyncChannel>,
        cache: LocalCache,
        gate: AdminGate,
        default_tree: MenuTree,
    ) -> Self {
        let initial = match cache.load() {
            Some(tree) => tree,
            None => {
                debug!("No cached menu, starting from default");
                default_tree.clone()
            }
        };
        Self {
            remote,
            cache,
            store: MenuStore::new(initial),
            gate,
            default_tree,
            seed_attempted: false,
            subscription: None,
        }
    }

    /// Subscribes to the remote record. Calling it on an open session is a no-op.
    pub async fn open(&mut self) -> Result<(), SyncError> {
        if self.subscription.is_some() {
            return Ok(());
        }
        let sub = self.remote.subscribe().await?;
        self.subscription = Some(sub);
        info!("Menu session opened (key: {})", self.cache.key());
        Ok(())
    }

    /// Stops remote delivery. Writes already in flight are not cancelled.
    pub fn close(&mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.close();
            info!("Menu session closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.subscription.is_some()
    }

    /// Waits for the next remote update and applies it. Returns `None` when the
    /// session is closed or the remote side went away.
    pub async fn next_update(&mut self) -> Option<Reconciled> {
        let update = self.subscription.as_mut()?.next().await;
        match update {
            Some(update) => Some(self.apply_remote(update).await),
            None => {
                warn!("Remote subscription ended");
                self.subscription = None;
                None
            }
        }
    }

    pub async fn apply_remote(&mut self, update: RemoteUpdate) -> Reconciled {
        match update.value {
            Some(bytes) => match MenuTree::from_json_slice(&bytes) {
                Ok(tree) => {
                    let discarded_edits = self.store.has_unsaved_edits();
                    if discarded_edits {
                        warn!("Remote update replaced unsaved admin edits");
                    }
                    self.cache.store(&tree);
                    let sections = tree.len();
                    self.store.replace(tree);
                    debug!("Applied remote menu ({} sections)", sections);
                    Reconciled::Replaced {
                        sections,
                        discarded_edits,
                    }
                }
                Err(e) => {
                    warn!("Rejected remote menu, keeping last known good: {}", e);
                    Reconciled::Rejected(e.to_string())
                }
            },
            None if self.seed_attempted => {
                debug!("Remote menu still absent, seed already attempted");
                Reconciled::SeedSkipped
            }
            None => {
                self.seed_attempted = true;
                match self.remote.write(&self.default_tree).await {
                    Ok(()) => {
                        info!("Seeded remote with default menu");
                        Reconciled::Seeded
                    }
                    Err(e) => {
                        error!("Failed to seed remote menu: {}", e);
                        Reconciled::SeedFailed(e.to_string())
                    }
                }
            }
        }
    }

    pub fn tree(&self) -> &MenuTree {
        self.store.tree()
    }

    pub fn has_unsaved_edits(&self) -> bool {
        self.store.has_unsaved_edits()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn is_admin(&self) -> bool {
        self.gate.is_unlocked()
    }

    pub fn attempt_login(&mut self, input: &mut String) -> Result<(), AuthError> {
        self.gate.attempt_login(input)
    }

    pub fn update_price(
        &mut self,
        section_id: &str,
        item_index: usize,
        price_index: usize,
        value: impl Into<String>,
    ) -> Result<(), EditError> {
        let value = value.into();
        self.edit(|t| ops::update_price(t, section_id, item_index, price_index, value))
    }

    pub fn toggle_tag(&mut self, section_id: &str, item_index: usize, tag: Tag) -> Result<(), EditError> {
        self.edit(|t| ops::toggle_tag(t, section_id, item_index, tag))
    }

    pub fn delete_item(&mut self, section_id: &str, item_index: usize) -> Result<(), EditError> {
        self.edit(|t| ops::delete_item(t, section_id, item_index))
    }

    pub fn reorder_item(
        &mut self,
        section_id: &str,
        item_index: usize,
        direction: Direction,
    ) -> Result<(), EditError> {
        self.edit(|t| ops::reorder_item(t, section_id, item_index, direction))
    }

    fn edit<F>(&mut self, op: F) -> Result<(), EditError>
    where
        F: FnOnce(&MenuTree) -> Result<MenuTree, EditError>,
    {
        if !self.gate.is_unlocked() {
            return Err(EditError::Locked);
        }
        self.store.apply(op)
    }

    /// Writes the whole store to the remote. On success the gate locks; on failure
    /// the gate stays unlocked and the edits stay in the store.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        if !self.gate.is_unlocked() {
            return Err(SessionError::Locked);
        }
        match self.remote.write(self.store.tree()).await {
            Ok(()) => {
                self.store.mark_saved();
                self.gate.lock();
                info!("Menu saved ({} items)", self.store.tree().item_count());
                Ok(())
            }
            Err(e) => {
                error!("Failed to save menu: {}", e);
                Err(e.into())
            }
        }
    }

    /// Locks without writing. Local edits are not rolled back; the next remote
    /// update replaces them.
    pub fn cancel(&mut self) {
        self.gate.lock();
    }
}

impl Drop for MenuSession {
    fn drop(&mut self) {
        self.close();
    }
}
