pub mod conn_kv;
pub mod conn_sub;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::pubsub::PubSubBus;
use crate::store::{Record, RecordStore};
use crate::time::now_ms;
use bytes::Bytes;
use menu_proto::PushEvent;
use parking_lot::Mutex;
use std::fs;
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, Semaphore};

pub struct Context {
    pub records: RecordStore,
    pub pubsub: PubSubBus,
    pub metrics: Arc<Metrics>,
    pub cfg: Config,
    pub op_semaphore: Semaphore,
    /// Serialises commit + publish so every subscriber sees writes in commit order.
    commit: Mutex<()>,
}

impl Context {
    pub fn new(cfg: Config) -> Self {
        let metrics = Arc::new(Metrics::new());
        Self {
            records: RecordStore::default(),
            pubsub: PubSubBus::new(cfg.pubsub_capacity, metrics.clone()),
            op_semaphore: Semaphore::new(cfg.max_concurrent_ops),
            metrics,
            cfg,
            commit: Mutex::new(()),
        }
    }

    /// Stores `value` under `key` and pushes it to the key's subscribers.
    pub fn commit_write(&self, key: String, value: Bytes) {
        let _guard = self.commit.lock();
        let now = now_ms();
        self.records.set(key.clone(), value.clone(), now);
        self.metrics.inc_writes();
        self.pubsub.publish(PushEvent {
            key,
            value: Some(value),
            ts_ms: now,
        });
    }

    /// Removes `key`; subscribers are told the record is now absent.
    pub fn commit_delete(&self, key: String) -> bool {
        let _guard = self.commit.lock();
        let existed = self.records.del(&key);
        if existed {
            self.metrics.inc_writes();
            self.pubsub.publish(PushEvent {
                key,
                value: None,
                ts_ms: now_ms(),
            });
        }
        existed
    }

    /// Current value plus a receiver for every later write, with no gap between them.
    pub fn snapshot_and_subscribe(&self, key: &str) -> (PushEvent, broadcast::Receiver<PushEvent>) {
        let _guard = self.commit.lock();
        let rx = self.pubsub.subscribe(key);
        (self.snapshot(key), rx)
    }

    pub fn snapshot(&self, key: &str) -> PushEvent {
        match self.records.get(key) {
            Some(Record { value, written_ms }) => PushEvent {
                key: key.to_string(),
                value: Some(value),
                ts_ms: written_ms,
            },
            None => PushEvent {
                key: key.to_string(),
                value: None,
                ts_ms: now_ms(),
            },
        }
    }
}

pub async fn run(cfg: Config) -> anyhow::Result<()> {
    tracing::info!("Starting menu sync server at {}", cfg.socket_path.display());
    tracing::info!("Max concurrent ops: {}", cfg.max_concurrent_ops);

    if cfg.socket_path.exists() {
        fs::remove_file(&cfg.socket_path)?;
    }

    let pid = std::process::id();
    fs::write(&cfg.pid_path, pid.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to write PID file to {}: {}", cfg.pid_path.display(), e))?;

    let listener = UnixListener::bind(&cfg.socket_path)?;
    let socket_path = cfg.socket_path.clone();
    let pid_path = cfg.pid_path.clone();
    let ctx = Arc::new(Context::new(cfg));

    tokio::select! {
        res = serve(listener, ctx) => res?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
    }

    let _ = fs::remove_file(&socket_path);
    let _ = fs::remove_file(&pid_path);
    Ok(())
}

/// Accept loop. Each connection gets its own task.
pub async fn serve(listener: UnixListener, ctx: Arc<Context>) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let c = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, c).await {
                        tracing::error!("Connection error: {}", e);
                    }
                });
            }
            Err(e) => {
                tracing::error!("Accept error: {}", e);
            }
        }
    }
}

async fn handle_connection(mut stream: UnixStream, ctx: Arc<Context>) -> anyhow::Result<()> {
    // A connection starts in request/response mode and switches to push mode on SUBSCRIBE.
    conn_kv::handle_conn(&mut stream, &ctx).await
}
