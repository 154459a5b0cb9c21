use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for projman operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

/// Storage-related errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access storage at {path:?}: {message}")]
    AccessError { path: PathBuf, message: String },

    #[error("Storage corrupted: {0}")]
    Corrupted(String),

    #[error("Storage locked by another process")]
    Locked,
}

/// Token-related errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
}

/// Result type alias for projman operations
pub type Result<T> = std::result::Result<T, Error>;
