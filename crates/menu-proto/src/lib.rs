pub mod error;
pub mod key;
pub mod payload;
pub mod stats;
pub mod types;

pub use error::*;
pub use key::*;
pub use payload::*;
pub use stats::*;
pub use types::*;
