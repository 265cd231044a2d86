//! Record server for the menu sync channel.
//!
//! Holds one value per record key and pushes the full value to every subscriber of
//! that key after each write. Subscribers receive the current value (or its absence)
//! as soon as they subscribe.

pub mod config;
pub mod framing;
pub mod metrics;
pub mod pubsub;
pub mod server;
pub mod store;
pub mod time;
