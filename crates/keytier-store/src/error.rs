//! # Storage Errors
//!
//! Errors surfaced by store implementations. The ledger engine maps these
//! onto its public taxonomy at the operation boundary.

use thiserror::Error;

/// Errors raised by [`LedgerStore`](crate::LedgerStore) and
/// [`DeviceStore`](crate::DeviceStore) implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A version expectation in a write batch did not hold — a concurrent
    /// commit mutated the record after it was read.
    #[error("version conflict on {entity}")]
    Conflict {
        /// Description of the conflicting record.
        entity: String,
    },

    /// A referenced record does not exist.
    #[error("not found: {entity}")]
    NotFound {
        /// Description of the missing record.
        entity: String,
    },

    /// A record expected to be absent already exists.
    #[error("already exists: {entity}")]
    AlreadyExists {
        /// Description of the pre-existing record.
        entity: String,
    },

    /// A directory registration referenced an illegal parent link.
    #[error("invalid hierarchy link: {0}")]
    InvalidHierarchy(String),

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
