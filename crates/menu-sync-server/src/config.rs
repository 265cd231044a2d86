use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub max_frame_bytes: usize,
    /// Per-record broadcast buffer; a slower subscriber skips the oldest buffered events.
    pub pubsub_capacity: usize,
    pub max_concurrent_ops: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/run/menusync.sock"),
            pid_path: PathBuf::from("/run/menusync.pid"),
            max_frame_bytes: 8 * 1024 * 1024,
            pubsub_capacity: 64,
            max_concurrent_ops: 1_000,
        }
    }
}

impl Config {
    /// Reads `MENUSYNC_*` variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut c = Self::default();
        if let Some(v) = get("MENUSYNC_SOCKET") {
            c.socket_path = PathBuf::from(v);
            c.pid_path = pid_path_for(&c.socket_path);
        }
        if let Some(v) = get("MENUSYNC_PID_FILE") {
            c.pid_path = PathBuf::from(v);
        }
        c.max_frame_bytes = parse_or("MENUSYNC_MAX_FRAME", get("MENUSYNC_MAX_FRAME"), c.max_frame_bytes);
        c.pubsub_capacity =
            parse_or("MENUSYNC_PUBSUB_CAP", get("MENUSYNC_PUBSUB_CAP"), c.pubsub_capacity).max(1);
        c.max_concurrent_ops = parse_or(
            "MENUSYNC_MAX_CONCURRENT_OPS",
            get("MENUSYNC_MAX_CONCURRENT_OPS"),
            c.max_concurrent_ops,
        )
        .max(1);
        c
    }
}

/// `/run/x/menusync.sock` -> `/run/x/menusync.pid`
fn pid_path_for(socket: &Path) -> PathBuf {
    socket.with_extension("pid")
}

fn parse_or<T: FromStr + Copy>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", name, v);
            default
        }),
    }
}
