//! Error types

use thiserror::Error;

/// Remote write or subscription failure. The message carries the underlying cause.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode menu: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Subscription closed")]
    Closed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid admin password")]
    InvalidCredential,

    #[error("Admin access is not configured")]
    Disabled,

    #[error("Password hash error: {0}")]
    HashError(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Admin session is locked")]
    Locked,

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Item {index} out of range in section {section} ({len} items)")]
    ItemOutOfRange {
        section: String,
        index: usize,
        len: usize,
    },

    #[error("Price {index} out of range for item {item} in section {section} ({len} prices)")]
    PriceOutOfRange {
        section: String,
        item: usize,
        index: usize,
        len: usize,
    },
}

/// A menu document that does not have the expected shape.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Malformed menu document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid field: {0}")]
    Field(#[from] validator::ValidationErrors),

    #[error("Duplicate section id: {0}")]
    DuplicateSectionId(String),

    #[error("Item {item} in section {section} has {labels} labels for {prices} prices")]
    LabelsMisaligned {
        section: String,
        item: usize,
        prices: usize,
        labels: usize,
    },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Admin session is locked")]
    Locked,
}

/// Startup errors: configuration, record key, default document.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    #[error("Invalid record key: {0}")]
    RecordKey(#[from] menu_proto::ProtoError),

    #[error("Default menu error: {0}")]
    DefaultMenu(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
