//! Remote sync channel port.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::SyncError;
use crate::model::MenuTree;

/// Queue depth between a channel's forwarder and its session.
pub const SUBSCRIPTION_BUFFER: usize = 16;

/// One value delivered by the remote: the raw document, or `None` when the record
/// has never been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUpdate {
    pub value: Option<Bytes>,
}

impl RemoteUpdate {
    pub fn present(value: impl Into<Bytes>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn absent() -> Self {
        Self { value: None }
    }
}

/// A stream of [`RemoteUpdate`]s in remote commit order.
///
/// Dropping it (or calling [`Subscription::close`]) stops delivery and aborts the
/// task feeding it.
pub struct Subscription {
    rx: mpsc::Receiver<RemoteUpdate>,
    forwarder: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<RemoteUpdate>) -> Self {
        Self { rx, forwarder: None }
    }

    /// Sender and subscription ends of a fresh queue.
    pub fn pair() -> (mpsc::Sender<RemoteUpdate>, Self) {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        (tx, Self::new(rx))
    }

    /// Ties a background task's lifetime to this subscription.
    pub fn with_forwarder(mut self, task: JoinHandle<()>) -> Self {
        self.forwarder = Some(task);
        self
    }

    /// Next update, or `None` once the channel side has gone away.
    pub async fn next(&mut self) -> Option<RemoteUpdate> {
        self.rx.recv().await
    }

    pub fn close(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(task) = self.forwarder.take() {
            task.abort();
        }
    }
}

/// Push-subscribe access to the one shared menu record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteSyncChannel: Send + Sync {
    /// The current value arrives first, then every later write from any session.
    async fn subscribe(&self) -> Result<Subscription, SyncError>;

    /// Overwrites the whole remote record.
    async fn write(&self, tree: &MenuTree) -> Result<(), SyncError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drop_aborts_forwarder() {
        let (tx, sub) = Subscription::pair();
        let task = tokio::spawn(async { std::future::pending::<()>().await });
        let sub = sub.with_forwarder(task);

        sub.close();
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_next_returns_none_when_sender_gone() {
        let (tx, mut sub) = Subscription::pair();
        tx.send(RemoteUpdate::absent()).await.unwrap();
        drop(tx);
        assert_eq!(sub.next().await, Some(RemoteUpdate::absent()));
        assert_eq!(sub.next().await, None);
    }
}
