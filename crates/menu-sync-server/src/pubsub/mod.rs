pub mod bus;

pub use bus::PubSubBus;
