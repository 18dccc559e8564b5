//! Common error types for the MAX5820 controller.
//!
//! This module provides a centralized Error enum using thiserror,
//! with conversions from underlying error types used throughout the crate.

use thiserror::Error;

/// Main error type for MAX5820 operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller passed something the chip cannot express: a channel index
    /// other than 0 or 1, a raw code above 255, or a zero fallback voltage.
    /// Always raised before any bus traffic.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors from the transport or the regulator
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bus moved fewer bytes than the transaction needs. Partial
    /// transfers are never retried here; the caller decides.
    #[error("short transfer on the bus: {actual} of {expected} bytes")]
    ShortTransfer { expected: usize, actual: usize },

    /// The reference voltage could not be resolved at initialize time
    /// and no fallback was configured.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
