//! Error types for the voxstream crate

use thiserror::Error;

/// Main error type for the store and streaming layers
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("corrupt region file: {0}")]
    CorruptRegion(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
