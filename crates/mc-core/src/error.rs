//! # AppError
//!
//! Centralized error handling for the moderation console.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all mc-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., an ad id absent from the collection)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., rejection without a reason)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Retrieval or submission call to the ad source failed.
    /// The store is left at its last-known-good state.
    #[error("transport error: {0}")]
    Transport(String),

    /// The record changed underneath a command (e.g., a refresh landed
    /// while a decision was in flight)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed data coming from a source (e.g., an unparseable timestamp)
    #[error("parse error: {0}")]
    Parse(String),

    /// Infrastructure failure not attributable to the caller
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn ad_not_found(id: u64) -> Self {
        AppError::NotFound("Ad".to_string(), id.to_string())
    }
}

/// A specialized Result type for moderation console logic.
pub type Result<T> = std::result::Result<T, AppError>;
