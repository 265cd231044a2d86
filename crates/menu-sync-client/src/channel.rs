use async_trait::async_trait;
use menu_core::{MenuTree, RemoteSyncChannel, RemoteUpdate, Subscription, SyncError};
use menu_proto::{ProtoError, RecordKey};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::Client;

/// [`RemoteSyncChannel`] backed by a menu-sync-server over a Unix socket.
///
/// Each subscription holds its own connection in push mode; each write opens a
/// short-lived connection.
#[derive(Debug, Clone)]
pub struct SocketChannel {
    socket_path: PathBuf,
    key: RecordKey,
}

impl SocketChannel {
    pub fn new(socket_path: impl Into<PathBuf>, key: RecordKey) -> Self {
        Self {
            socket_path: socket_path.into(),
            key,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    async fn connect(&self) -> Result<Client, SyncError> {
        Client::connect(&self.socket_path)
            .await
            .map_err(|e| unavailable(&self.socket_path, e))
    }
}

fn unavailable(path: &Path, e: ProtoError) -> SyncError {
    SyncError::Unavailable(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl RemoteSyncChannel for SocketChannel {
    async fn subscribe(&self) -> Result<Subscription, SyncError> {
        let client = self.connect().await?;
        let mut push = client
            .subscribe(self.key.as_str())
            .await
            .map_err(|e| unavailable(&self.socket_path, e))?;

        let (tx, subscription) = Subscription::pair();
        let key = self.key.as_str().to_string();
        let forwarder = tokio::spawn(async move {
            loop {
                match push.next_event().await {
                    Ok(Some(ev)) if ev.key == key => {
                        if tx.send(RemoteUpdate { value: ev.value }).await.is_err() {
                            break;
                        }
                    }
                    Ok(Some(ev)) => debug!("Ignoring push for unrelated key {}", ev.key),
                    Ok(None) => {
                        debug!("Record service closed subscription on {}", key);
                        break;
                    }
                    Err(e) => {
                        warn!("Subscription on {} failed: {}", key, e);
                        break;
                    }
                }
            }
        });

        Ok(subscription.with_forwarder(forwarder))
    }

    async fn write(&self, tree: &MenuTree) -> Result<(), SyncError> {
        let bytes = tree.to_json_vec()?;
        let mut client = self.connect().await?;
        client
            .set(self.key.as_str(), &bytes)
            .await
            .map_err(|e| unavailable(&self.socket_path, e))?;
        debug!("Wrote {} bytes to {}", bytes.len(), self.key);
        Ok(())
    }
}
