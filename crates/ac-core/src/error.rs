//! # AppError
//!
//! Centralized error handling for altchan.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for service operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Board)
    #[error("{0} {1} does not exist")]
    NotFound(&'static str, String),

    /// The submission failed validation. Carries every user-facing message.
    #[error("submission rejected: {}", .0.join(" "))]
    Rejected(Vec<String>),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

/// A specialized Result type for altchan logic.
pub type Result<T> = std::result::Result<T, AppError>;
