//! # keytier-ledger — The Keytier Ledger Engine
//!
//! The core of the Keytier distribution ledger: a fixed five-tier
//! hierarchy (super-admin → super-distributor → distributor → retailer →
//! end-user) creates, transfers, revokes, and provisions license keys
//! with per-participant wallet counters and an append-only, paginated
//! transaction log.
//!
//! ## Operations
//!
//! [`LedgerEngine`] exposes one async method per ledger operation:
//!
//! - [`create_keys`](LedgerEngine::create_keys) — super-admin mints keys.
//! - [`transfer_keys`](LedgerEngine::transfer_keys) — move keys down one
//!   hierarchy edge.
//! - [`revoke_keys`](LedgerEngine::revoke_keys) — super-admin pulls keys
//!   out of circulation.
//! - [`provision_key`](LedgerEngine::provision_key) — retailer binds a
//!   key to an end user with an EMI plan.
//! - [`list_transactions`](LedgerEngine::list_transactions) — cursor-
//!   paginated audit history.
//! - [`wallet`](LedgerEngine::wallet) / [`list_keys`](LedgerEngine::list_keys)
//!   — counter and inventory views.
//!
//! ## Atomicity
//!
//! Each operation's key-state changes and wallet updates commit as one
//! version-checked write batch: all-or-nothing, with concurrent
//! operations serialized by optimistic conflict detection. The
//! transaction-log append and provisioning's device-store write sit
//! outside that boundary; see the error taxonomy in [`LedgerError`]
//! for how the difference surfaces.
//!
//! ## Example
//!
//! ```
//! use keytier_core::Role;
//! use keytier_ledger::{Actor, LedgerEngine};
//! use keytier_store::{MemoryDeviceStore, MemoryLedgerStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), keytier_ledger::LedgerError> {
//! let store = MemoryLedgerStore::new();
//! let admin = store
//!     .register_user(Role::SuperAdmin, "root", None)
//!     .map_err(keytier_ledger::LedgerError::from)?;
//! let engine = LedgerEngine::new(store.clone(), store, MemoryDeviceStore::new());
//!
//! let actor = Actor { id: admin.id, role: admin.role };
//! let keys = engine.create_keys(actor, 10, 12).await?;
//! assert_eq!(keys.len(), 10);
//! assert_eq!(engine.wallet(admin.id).await?.available_keys, 10);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod provision;

// ─── Engine re-exports ───────────────────────────────────────────────

pub use config::LedgerConfig;
pub use engine::{Actor, LedgerEngine};
pub use error::LedgerError;
pub use provision::{EmiPlan, EndUserProfile};

// ─── Convenience re-exports from the lower layers ────────────────────

pub use keytier_core::{Role, Wallet};
pub use keytier_state::{KeyRecord, KeyStatus};
pub use keytier_store::{Cursor, Page, TransactionAction, TransactionRecord};
