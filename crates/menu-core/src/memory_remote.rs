//! In-process remote: one record shared by every session holding a clone.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::channel::{RemoteSyncChannel, RemoteUpdate, Subscription};
use crate::error::SyncError;
use crate::model::MenuTree;

const BROADCAST_CAPACITY: usize = 64;

struct Shared {
    value: Mutex<Option<Bytes>>,
    tx: broadcast::Sender<Option<Bytes>>,
    offline: AtomicBool,
    writes: AtomicU64,
}

/// Clones share the same record, so two sessions built from clones of one
/// `MemoryRemote` see each other's writes.
#[derive(Clone)]
pub struct MemoryRemote {
    shared: Arc<Shared>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                value: Mutex::new(None),
                tx,
                offline: AtomicBool::new(false),
                writes: AtomicU64::new(0),
            }),
        }
    }

    /// Makes every later write fail with [`SyncError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> u64 {
        self.shared.writes.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Option<Bytes> {
        self.shared.value.lock().clone()
    }

    pub fn current_tree(&self) -> Option<MenuTree> {
        self.current()
            .and_then(|b| MenuTree::from_json_slice(&b).ok())
    }

    /// Stores raw bytes without any shape check, as a foreign writer could.
    pub fn put_raw(&self, value: Option<Bytes>) {
        let mut slot = self.shared.value.lock();
        *slot = value.clone();
        let _ = self.shared.tx.send(value);
    }
}

#[async_trait]
impl RemoteSyncChannel for MemoryRemote {
    async fn subscribe(&self) -> Result<Subscription, SyncError> {
        let (tx, subscription) = Subscription::pair();

        let (current, mut rx) = {
            let slot = self.shared.value.lock();
            (slot.clone(), self.shared.tx.subscribe())
        };
        tx.try_send(RemoteUpdate { value: current })
            .map_err(|_| SyncError::Closed)?;

        let forwarder = tokio::spawn(async move {
            loop {
                let value = match rx.recv().await {
                    Ok(v) => v,
                    Err(RecvError::Lagged(n)) => {
                        // What is still buffered is in order and ends with the newest write
                        debug!("Memory subscriber lagged by {}", n);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if tx.send(RemoteUpdate { value }).await.is_err() {
                    break;
                }
            }
        });

        Ok(subscription.with_forwarder(forwarder))
    }

    async fn write(&self, tree: &MenuTree) -> Result<(), SyncError> {
        if self.shared.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable("remote is offline".into()));
        }
        let bytes = Bytes::from(tree.to_json_vec()?);
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        self.put_raw(Some(bytes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::builtin_menu;

    #[tokio::test]
    async fn test_subscribe_yields_current_first() {
        let remote = MemoryRemote::new();
        let mut sub = remote.subscribe().await.unwrap();
        assert_eq!(sub.next().await, Some(RemoteUpdate::absent()));

        remote.write(&builtin_menu()).await.unwrap();
        let update = sub.next().await.unwrap();
        assert_eq!(MenuTree::from_json_slice(&update.value.unwrap()).unwrap(), builtin_menu());
    }

    #[tokio::test]
    async fn test_two_subscriptions_are_independent() {
        let remote = MemoryRemote::new();
        let mut a = remote.subscribe().await.unwrap();
        let mut b = remote.subscribe().await.unwrap();
        a.next().await.unwrap();
        b.next().await.unwrap();

        drop(a);
        remote.write(&builtin_menu()).await.unwrap();
        assert!(b.next().await.unwrap().value.is_some());
        assert_eq!(remote.write_count(), 1);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_keeps_commit_order() {
        const WRITES: u32 = 100;
        let remote = MemoryRemote::new();
        let mut sub = remote.subscribe().await.unwrap();
        assert_eq!(sub.next().await, Some(RemoteUpdate::absent()));

        for i in 1..=WRITES {
            remote.put_raw(Some(Bytes::from(i.to_string())));
            tokio::task::yield_now().await;
        }

        let mut seen = Vec::new();
        while seen.last() != Some(&WRITES) {
            let value = sub.next().await.unwrap().value.unwrap();
            seen.push(std::str::from_utf8(&value).unwrap().parse::<u32>().unwrap());
        }
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "out of order: {seen:?}");
        assert!(seen.len() < WRITES as usize);
    }

    #[tokio::test]
    async fn test_offline_write_fails_and_keeps_value() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);
        let err = remote.write(&builtin_menu()).await.unwrap_err();
        assert!(err.to_string().contains("offline"));
        assert!(remote.current().is_none());
        assert_eq!(remote.write_count(), 0);
    }
}
