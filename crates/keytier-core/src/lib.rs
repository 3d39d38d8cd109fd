//! # keytier-core — Foundational Types for the Keytier Ledger
//!
//! This crate is the bedrock of the Keytier distribution ledger. It defines
//! the type-system primitives every other crate in the workspace builds on;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `UserId`, `KeyId`,
//!    `TransactionId`, `EndUserId`, `DeviceRecordId` — all newtypes over
//!    UUIDs. No bare strings for identifiers.
//!
//! 2. **Single `Role` enum.** One closed definition of the distribution
//!    hierarchy, exhaustive `match` everywhere. Role strings are parsed
//!    strictly at the boundary; unknown or non-canonical spellings are
//!    rejected, never silently normalized.
//!
//! 3. **A static hierarchy edge table.** The permitted parent→child role
//!    pairs live in one table consulted by both transfer authorization and
//!    directory queries — there is exactly one place where the hierarchy
//!    shape is written down.
//!
//! 4. **UTC-only timestamps.** The `Timestamp` type enforces UTC with
//!    microsecond precision. Microseconds matter here: transaction-log
//!    cursors are derived from timestamps and rely on sub-second resolution
//!    for uniqueness.
//!
//! 5. **Checked counter arithmetic.** `Wallet` mutators never wrap and
//!    never panic; overflow and underflow surface as typed errors.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `keytier-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod identity;
pub mod role;
pub mod temporal;
pub mod wallet;

// Re-export primary types for ergonomic imports.
pub use error::CoreError;
pub use identity::{DeviceRecordId, EndUserId, KeyId, TransactionId, UserId};
pub use role::{HierarchyEdge, Role, HIERARCHY_EDGES};
pub use temporal::Timestamp;
pub use wallet::Wallet;
