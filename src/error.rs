//! Custom error types for sitevault
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for sitevault operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// Configuration-related errors (bad destination, missing section)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local filesystem I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Remote transfer errors (upload/download/list/delete/rename)
    #[error("Transfer error: {0}")]
    Transfer(String),

    /// Authentication tag verification failure on decrypt.
    /// Always fatal, never retried.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Malformed key material or envelope framing
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Requested generation or artifact absent
    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    /// External collaborator tool failure (mysqldump, mysql)
    #[error("External tool failed: {0}")]
    External(String),
}

impl VaultError {
    /// Create a "not found" error for a generation slot
    pub fn slot_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Generation slot",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for an artifact
    pub fn artifact_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Artifact",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<s3::error::S3Error> for VaultError {
    fn from(err: s3::error::S3Error) -> Self {
        Self::Transfer(err.to_string())
    }
}

impl From<suppaftp::FtpError> for VaultError {
    fn from(err: suppaftp::FtpError) -> Self {
        Self::Transfer(err.to_string())
    }
}

/// Result type alias for sitevault operations
pub type VaultResult<T> = Result<T, VaultError>;
