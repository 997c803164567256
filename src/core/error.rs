//! Error types for the polynomial feature sampler

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SketchError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Sampler not fitted")]
    NotFitted,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, SketchError>;
