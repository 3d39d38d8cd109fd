//! # Ledger Error Taxonomy
//!
//! The public error type every engine operation returns. Lower layers
//! keep their own error enums (`CoreError`, `KeyStateError`,
//! `StoreError`); this module maps them onto the operation-level
//! taxonomy at the engine boundary.
//!
//! All primary operations are atomic: every variant except
//! [`LedgerError::PartialFailure`] means zero side effects occurred.
//! `PartialFailure` is unique to provisioning — the primary commit
//! landed but the best-effort device-store write did not, and the caller
//! must reconcile using the returned end-user id.

use thiserror::Error;

use keytier_core::{CoreError, EndUserId};
use keytier_state::KeyStateError;
use keytier_store::StoreError;

/// Errors returned by ledger engine operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed input: count out of range, invalid validity window,
    /// missing or malformed fields.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller's role does not permit the requested operation or
    /// hierarchy edge.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A referenced user, key, or end user does not exist (or no
    /// eligible keys were found at all).
    #[error("not found: {0}")]
    NotFound(String),

    /// Fewer eligible keys than requested. Nothing was transferred or
    /// revoked.
    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        /// Keys requested.
        requested: u64,
        /// Eligible keys actually available.
        available: u64,
    },

    /// A concurrent commit invalidated this operation's read set. Safe
    /// to retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Provisioning's primary commit succeeded but the best-effort
    /// device-store write failed. The caller must reconcile manually.
    #[error("partially completed for {end_user}: {detail}")]
    PartialFailure {
        /// The end user that was created by the committed primary phase.
        end_user: EndUserId,
        /// What failed after the commit.
        detail: String,
    },

    /// The backing store could not serve the request.
    #[error("internal: {0}")]
    Internal(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { entity } => Self::Conflict(entity),
            StoreError::AlreadyExists { entity } => Self::Conflict(entity),
            StoreError::NotFound { entity } => Self::NotFound(entity),
            StoreError::InvalidHierarchy(msg) => Self::InvalidArgument(msg),
            StoreError::Unavailable(msg) => Self::Internal(msg),
        }
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownRole(_) | CoreError::InvalidTimestamp(_) => {
                Self::InvalidArgument(err.to_string())
            }
            // Counter over/underflow is only reachable when a concurrent
            // commit invalidated the wallet read.
            CoreError::CounterOverflow { .. } | CoreError::CounterUnderflow { .. } => {
                Self::Conflict(err.to_string())
            }
        }
    }
}

impl From<KeyStateError> for LedgerError {
    fn from(err: KeyStateError) -> Self {
        // Keys are selected by status before a transition is attempted;
        // a rejected transition means the read set went stale.
        Self::Conflict(err.to_string())
    }
}
