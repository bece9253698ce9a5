// src/error.rs
use thiserror::Error;

/// Why a CDR line was refused by the parser. Always recoverable: the
/// line is logged and dropped, the connection keeps flowing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseRejection {
    #[error("insufficient fields: expected at least {expected}, got {got}")]
    InsufficientFields { expected: usize, got: usize },

    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("invalid timestamp in field '{field}': {value}")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// Failures from the persistence collaborator. `DuplicateKey` is the
/// store's unique-constraint violation on `call_id` and is never
/// surfaced past the recorder, which folds it into a duplicate outcome.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate call_id: {0}")]
    DuplicateKey(String),

    #[error("transient store error: {0}")]
    Transient(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to bind CDR listener on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),
}
