//! # Transaction Log — Append-Only Audit Trail
//!
//! Records every ledger operation for audit. Entries are created once by
//! the ledger engine, immediately after the operation's atomic commit, and
//! are never updated or deleted.
//!
//! ## Ordering Invariant
//!
//! The log clock allocates strictly increasing microsecond timestamps
//! (`next = max(now, last + 1µs)`), so record timestamps are unique and
//! totally ordered. That is what makes timestamp-derived cursors safe:
//! a page fetched with a cursor sees exactly the records older than the
//! cursor, unaffected by appends that happen between page fetches.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use keytier_core::{EndUserId, KeyId, Role, Timestamp, TransactionId, UserId};

use crate::error::StoreError;

// ─── Action ──────────────────────────────────────────────────────────

/// The ledger operation a transaction record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionAction {
    /// Keys minted by a super-admin.
    Created,
    /// Keys transferred down one hierarchy edge.
    Credited,
    /// Keys revoked out of a wallet.
    Revoked,
    /// A key consumed by end-user provisioning.
    Provisioned,
}

impl TransactionAction {
    /// Return the string value for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Credited => "credited",
            Self::Revoked => "revoked",
            Self::Provisioned => "provisioned",
        }
    }
}

impl std::fmt::Display for TransactionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Draft & Record ──────────────────────────────────────────────────

/// The engine-supplied portion of a transaction record.
///
/// The store assigns the identifier and the timestamp at append time, and
/// derives `participants` from the user fields.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    /// The operation performed.
    pub action: TransactionAction,
    /// Every key affected, in selection order. Batched operations produce
    /// one record for all keys.
    pub key_ids: Vec<KeyId>,
    /// Source wallet owner. `None` for minting.
    pub from_user: Option<UserId>,
    /// Role of `from_user`.
    pub from_role: Option<Role>,
    /// Destination wallet owner. `None` for revocation and provisioning.
    pub to_user: Option<UserId>,
    /// Role of the destination party.
    pub to_role: Option<Role>,
    /// The authenticated actor. May differ from `from_user` (a super-admin
    /// revoking on a distributor's behalf).
    pub performed_by: UserId,
    /// End user bound by a provisioning operation.
    pub end_user: Option<EndUserId>,
    /// Optional free-text reason.
    pub reason: Option<String>,
}

impl TransactionDraft {
    fn into_record(self, id: TransactionId, timestamp: Timestamp) -> TransactionRecord {
        let mut participants = BTreeSet::new();
        participants.extend(self.from_user);
        participants.extend(self.to_user);
        participants.insert(self.performed_by);
        TransactionRecord {
            id,
            action: self.action,
            key_ids: self.key_ids,
            from_user: self.from_user,
            from_role: self.from_role,
            to_user: self.to_user,
            to_role: self.to_role,
            performed_by: self.performed_by,
            participants,
            end_user: self.end_user,
            reason: self.reason,
            timestamp,
        }
    }
}

/// One immutable audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Record identifier.
    pub id: TransactionId,
    /// The operation performed.
    pub action: TransactionAction,
    /// Every key affected, in selection order.
    pub key_ids: Vec<KeyId>,
    /// Source wallet owner.
    pub from_user: Option<UserId>,
    /// Role of `from_user`.
    pub from_role: Option<Role>,
    /// Destination wallet owner.
    pub to_user: Option<UserId>,
    /// Role of the destination party.
    pub to_role: Option<Role>,
    /// The authenticated actor.
    pub performed_by: UserId,
    /// Participant ids this record is queryable under.
    pub participants: BTreeSet<UserId>,
    /// End user bound by a provisioning operation.
    pub end_user: Option<EndUserId>,
    /// Optional free-text reason.
    pub reason: Option<String>,
    /// Store-assigned creation instant; unique across the log.
    pub timestamp: Timestamp,
}

// ─── Cursor & Page ───────────────────────────────────────────────────

/// Opaque pagination token derived from a record's timestamp.
///
/// Callers treat it as a token: render with `Display`, parse with
/// `FromStr`, pass back to fetch the next older page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor {
    micros: i64,
}

impl Cursor {
    /// Derive a cursor from a record timestamp.
    pub fn from_timestamp(ts: Timestamp) -> Self {
        Self {
            micros: ts.epoch_micros(),
        }
    }

    /// The underlying epoch-microsecond position.
    pub fn epoch_micros(&self) -> i64 {
        self.micros
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.micros)
    }
}

impl FromStr for Cursor {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let micros = s
            .parse::<i64>()
            .map_err(|_| StoreError::Unavailable(format!("malformed cursor: {s:?}")))?;
        Ok(Self { micros })
    }
}

/// One page of a participant's transaction history, newest first.
#[derive(Debug, Clone)]
pub struct Page {
    /// The records on this page, strictly descending by timestamp.
    pub records: Vec<TransactionRecord>,
    /// Cursor positioned at the last record on this page, if any.
    pub next_cursor: Option<Cursor>,
    /// Whether fetching with `next_cursor` would yield more records.
    pub has_more: bool,
}

// ─── Log ─────────────────────────────────────────────────────────────

/// The append-only transaction log with its monotonic clock.
///
/// Not `Sync` by itself; the in-memory backend holds it inside its store
/// lock. Other backends may persist records however they like as long as
/// they uphold the ordering invariant.
#[derive(Debug, Default)]
pub struct TransactionLog {
    records: Vec<TransactionRecord>,
    last_micros: i64,
}

impl TransactionLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a draft, assigning the identifier and a strictly monotonic
    /// timestamp. Returns the completed record.
    pub fn append(&mut self, draft: TransactionDraft) -> Result<TransactionRecord, StoreError> {
        let micros = Timestamp::now().epoch_micros().max(self.last_micros + 1);
        let timestamp = Timestamp::from_epoch_micros(micros)
            .map_err(|e| StoreError::Unavailable(format!("log clock: {e}")))?;
        self.last_micros = micros;

        let record = draft.into_record(TransactionId::new(), timestamp);
        self.records.push(record.clone());
        Ok(record)
    }

    /// Number of records in the log.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One page of records where `participant` is involved, strictly
    /// descending by timestamp, starting strictly below `before` when a
    /// cursor is given.
    pub fn page_for(
        &self,
        participant: &UserId,
        before: Option<Cursor>,
        limit: usize,
    ) -> Page {
        let mut matching = self.records.iter().rev().filter(|r| {
            r.participants.contains(participant)
                && before.map_or(true, |c| r.timestamp.epoch_micros() < c.epoch_micros())
        });

        let records: Vec<TransactionRecord> = matching.by_ref().take(limit).cloned().collect();
        let has_more = matching.next().is_some();
        let next_cursor = records.last().map(|r| Cursor::from_timestamp(r.timestamp));

        Page {
            records,
            next_cursor,
            has_more,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
