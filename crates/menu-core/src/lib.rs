//! # Menu Core
//!
//! Menu document model, copy-on-write edit operations, the in-session store, the
//! local snapshot cache, the admin gate and the session that reconciles all of them
//! with a remote sync channel.

pub mod admin;
pub mod cache;
pub mod channel;
pub mod config;
pub mod defaults;
pub mod error;
pub mod memory_remote;
pub mod model;
pub mod ops;
pub mod session;
pub mod store;
pub mod telemetry;

pub use admin::{AdminCredential, AdminGate, GateState};
pub use cache::{FsSlots, LocalCache, MemorySlots, SlotStorage};
pub use channel::{RemoteSyncChannel, RemoteUpdate, Subscription};
pub use error::{AppError, AuthError, EditError, SessionError, SyncError, ValidationError};
pub use memory_remote::MemoryRemote;
pub use model::{MenuItem, MenuSection, MenuTree};
pub use ops::{Direction, Tag};
pub use session::{MenuSession, Reconciled};
pub use store::MenuStore;
