//! # Error Types — Core Primitives
//!
//! Errors raised by the foundational types in this crate. Higher layers
//! (`keytier-store`, `keytier-ledger`) define their own error enums and map
//! these at the boundary. All errors use `thiserror` for derive-based
//! `Display` and `Error` implementations.

use thiserror::Error;

/// Errors raised by core primitive types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A role string did not match any canonical role identifier.
    #[error("unknown role: {0:?}")]
    UnknownRole(String),

    /// A timestamp string was malformed or not UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A wallet counter would overflow.
    #[error("wallet counter {counter} overflow")]
    CounterOverflow {
        /// Name of the counter that would overflow.
        counter: &'static str,
    },

    /// A wallet counter would underflow below zero.
    #[error("wallet counter {counter} underflow")]
    CounterUnderflow {
        /// Name of the counter that would underflow.
        counter: &'static str,
    },
}
