//! Error types for fid-ds
//!
//! Defines the dispatch service error taxonomy using thiserror. The split
//! matters to callers: validation and domain rejections are deterministic
//! and safe to surface verbatim, infrastructure failures propagate for the
//! caller's retry policy, and cache trouble never appears here at all (the
//! cache degrades to a miss instead).

use crate::eligibility::IneligibilityReason;
use thiserror::Error;

/// Main error type for the dispatch service
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range request parameters, caught before any
    /// storage access; safe to retry after correcting input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Business-rule rejection with a specific reason code; never retried
    /// automatically
    #[error("Not eligible: {0}")]
    Domain(IneligibilityReason),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal operation deadline exceeded; reported as a retrieval
    /// failure, never silently degraded to an empty result
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the fid-ds Error
pub type Result<T> = std::result::Result<T, Error>;
