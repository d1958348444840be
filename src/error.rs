//! Error handling and custom error types
//!
//! Backend SDK errors never leave the adapters as-is; they are folded into one
//! of these variants with the original message preserved.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalidation failed: {0}")]
    InvalidationFailed(String),

    #[error("Invalidation status lookup failed: {0}")]
    StatusLookupFailed(String),

    #[error("URL signing error: {0}")]
    Signing(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("CloudFront error: {0}")]
    CloudFront(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
