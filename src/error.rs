//! Error types for the library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Lamport error: {0}")]
    Lamport(#[from] crate::lamport::LamportError),
    #[error("Forge error: {0}")]
    Forge(#[from] crate::forge::ForgeError),
}

/// Result alias over [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
