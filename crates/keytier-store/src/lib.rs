//! # keytier-store — Storage Seam for the Keytier Ledger
//!
//! Defines the storage traits the ledger engine is written against, the
//! record types those traits persist, the version-checked write batch
//! that is the atomic commit unit, and an in-memory backend suitable for
//! tests and embedding.
//!
//! ## Architecture
//!
//! Three traits split the three durability domains the engine touches:
//!
//! - [`LedgerStore`] — the primary transactional document store holding
//!   participants, keys, wallets, end users, and the transaction log.
//!   `commit` applies a [`WriteBatch`] all-or-nothing under optimistic
//!   concurrency; `append_transaction` sits outside that atomic
//!   boundary.
//! - [`Directory`] — the identity directory resolving a participant id to
//!   its role and hierarchy ancestry. Consumed, not owned, by the engine;
//!   the in-memory backend implements it over its own user collection.
//! - [`DeviceStore`] — the secondary store receiving best-effort device
//!   control records during provisioning. Failures here never roll back
//!   the primary commit.
//!
//! ## Concurrency
//!
//! Reads return [`Versioned`] values; write batches carry
//! [`Expectation`]s against those versions. Two operations racing for the
//! same eligible-key pool both read the same versions, the first commit
//! bumps them, and the second fails with [`StoreError::Conflict`] —
//! nothing is ever double-allocated.

use async_trait::async_trait;

pub mod batch;
pub mod device;
pub mod error;
pub mod log;
pub mod memory;
pub mod records;

use keytier_core::{DeviceRecordId, EndUserId, KeyId, UserId, Wallet};
use keytier_state::{KeyRecord, KeyStatus};

// ─── Re-exports ──────────────────────────────────────────────────────

pub use batch::{Expectation, WriteBatch, WriteOp};
pub use device::MemoryDeviceStore;
pub use error::StoreError;
pub use log::{
    Cursor, Page, TransactionAction, TransactionDraft, TransactionLog, TransactionRecord,
};
pub use memory::MemoryLedgerStore;
pub use records::{
    DeviceIdentifiers, DeviceRecord, EmiSchedule, EndUserRecord, UserRecord, Versioned,
};

// ─── Traits ──────────────────────────────────────────────────────────

/// The primary transactional document store.
///
/// Participant resolution lives on [`Directory`], not here, even when
/// one backend implements both traits.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetch a key with its commit version.
    async fn key(&self, id: &KeyId) -> Result<Option<Versioned<KeyRecord>>, StoreError>;

    /// The first `limit` keys assigned to `owner` in the given status,
    /// in creation order.
    async fn keys_assigned_to(
        &self,
        owner: &UserId,
        status: KeyStatus,
        limit: usize,
    ) -> Result<Vec<Versioned<KeyRecord>>, StoreError>;

    /// Read-only key inventory listing for `owner`, optionally filtered
    /// by status, in creation order.
    async fn list_keys(
        &self,
        owner: &UserId,
        status: Option<KeyStatus>,
        limit: usize,
    ) -> Result<Vec<KeyRecord>, StoreError>;

    /// Fetch a wallet with its commit version.
    async fn wallet(&self, user: &UserId) -> Result<Option<Versioned<Wallet>>, StoreError>;

    /// Fetch an end-user record.
    async fn end_user(&self, id: &EndUserId) -> Result<Option<EndUserRecord>, StoreError>;

    /// Apply a write batch atomically.
    ///
    /// Every [`Expectation`] is validated before anything is written; a
    /// single failed expectation rejects the entire batch with
    /// [`StoreError::Conflict`] (or [`StoreError::AlreadyExists`] for
    /// end-user inserts) and no write is applied.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Append one record to the transaction log.
    ///
    /// Outside the atomic boundary of [`commit`](Self::commit): the store
    /// assigns the identifier and a strictly monotonic timestamp.
    async fn append_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<TransactionRecord, StoreError>;

    /// One page of the transaction log for `participant`, newest first,
    /// strictly below `before` when a cursor is given.
    async fn transactions_for(
        &self,
        participant: &UserId,
        before: Option<Cursor>,
        limit: usize,
    ) -> Result<Page, StoreError>;
}

/// The identity directory: participant id → role and hierarchy ancestry.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a participant, or `None` if unknown.
    async fn resolve(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError>;
}

/// The secondary device-control store.
///
/// Writes are best-effort relative to the primary store: a failure here
/// is reported to the caller for reconciliation, never rolled back.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Write a device control record.
    async fn put_device(&self, record: DeviceRecord) -> Result<(), StoreError>;

    /// Fetch a device control record.
    async fn device(&self, id: &DeviceRecordId) -> Result<Option<DeviceRecord>, StoreError>;
}
