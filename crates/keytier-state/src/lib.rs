//! # keytier-state — Key Lifecycle State Machine
//!
//! Implements the lifecycle of a distributable key as a validated state
//! machine. Transitions are methods on [`KeyRecord`] that check the current
//! status and stamp the provenance fields for the new one; invalid
//! transitions are typed errors, never silent corruption.
//!
//! ## Lifecycle
//!
//! ```text
//! Unassigned ──▶ Credited ──▶ Credited (onward transfer)
//!     │              │
//!     │              ├──▶ Provisioned (terminal)
//!     │              │
//!     └──────────────┴──▶ Revoked (terminal)
//! ```
//!
//! A freshly minted key is `Unassigned` and owned by its creator. Each
//! transfer down the hierarchy leaves it `Credited` with updated ownership.
//! A retailer consumes it through provisioning, or a super-admin revokes it
//! out of any non-terminal state.
//!
//! `Expired` is not a state: expiry is derived at read time from
//! `valid_until` via [`KeyRecord::is_expired`]. Storing it would require
//! a sweeper mutating keys outside any ledger operation.
//!
//! ## Unlock Codes
//!
//! Each key carries its own [`UnlockCodeSet`] of 12 distinct 6-digit codes,
//! generated from a CSPRNG at mint time and immutable afterwards. The
//! uniqueness scope is the single key.

pub mod key;
pub mod unlock;

// ─── Key lifecycle re-exports ────────────────────────────────────────

pub use key::{KeyRecord, KeyStateError, KeyStatus};

// ─── Unlock code re-exports ──────────────────────────────────────────

pub use unlock::{UnlockCodeSet, UNLOCK_CODES_PER_KEY, UNLOCK_CODE_MAX, UNLOCK_CODE_MIN};
