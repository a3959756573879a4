//! Error types for storage scanning and image probing

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage provider error: {0}")]
    Provider(String),

    #[error("Container error: {0}")]
    Cso(#[from] cso::Error),
}

pub type Result<T> = std::result::Result<T, DiscError>;
