//! # Write Batches — the Atomic Commit Unit
//!
//! A [`WriteBatch`] collects every mutation of one ledger operation. The
//! store applies a batch all-or-nothing: each write carries an
//! [`Expectation`] about the record's current version, every expectation
//! is validated before anything is written, and a single failed
//! expectation rejects the whole batch with a conflict.
//!
//! This is what serializes concurrent operations racing for the same
//! eligible-key pool: both read the same versions, the first commit bumps
//! them, the second commit's expectations no longer hold.

use keytier_core::{UserId, Wallet};
use keytier_state::KeyRecord;

use crate::records::EndUserRecord;

/// Precondition on a record's version at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// The record must not exist yet.
    Absent,
    /// The record must exist at exactly this version.
    Version(u64),
}

/// One write inside a batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert or replace a key record.
    PutKey {
        /// Version precondition.
        expect: Expectation,
        /// The new record state (carries its own id).
        record: KeyRecord,
    },
    /// Insert or replace a wallet.
    PutWallet {
        /// Wallet owner.
        user: UserId,
        /// Version precondition.
        expect: Expectation,
        /// The new counter state.
        wallet: Wallet,
    },
    /// Insert a new end-user record. Always expects absence.
    PutEndUser {
        /// The record to insert.
        record: EndUserRecord,
    },
}

/// An ordered set of writes committed atomically.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a key write.
    pub fn put_key(&mut self, expect: Expectation, record: KeyRecord) {
        self.ops.push(WriteOp::PutKey { expect, record });
    }

    /// Queue a wallet write.
    pub fn put_wallet(&mut self, user: UserId, expect: Expectation, wallet: Wallet) {
        self.ops.push(WriteOp::PutWallet {
            user,
            expect,
            wallet,
        });
    }

    /// Queue an end-user insert.
    pub fn put_end_user(&mut self, record: EndUserRecord) {
        self.ops.push(WriteOp::PutEndUser { record });
    }

    /// The queued writes in insertion order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
