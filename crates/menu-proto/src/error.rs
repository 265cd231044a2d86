use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid record key format")]
    InvalidKeyFormat,

    #[error("bad payload")]
    BadPayload,

    #[error("invalid utf-8 in payload")]
    InvalidUtf8,

    #[error("record not found")]
    NotFound,

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("server error: {0}")]
    ServerError(String),
}
