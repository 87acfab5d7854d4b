use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("bad key size: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
