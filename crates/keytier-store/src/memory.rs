//! # In-Memory Ledger Store
//!
//! [`MemoryLedgerStore`] implements [`LedgerStore`] and [`Directory`] over
//! a single `parking_lot::RwLock`. Intended for tests and embedded
//! deployments; durable backends implement the same traits.
//!
//! All collections live behind one lock, which is what makes
//! [`commit`](LedgerStore::commit) genuinely atomic: expectations are
//! validated and writes applied under a single write guard. The lock is
//! never held across an `.await` point, and `parking_lot` locks are
//! non-poisonable — a panicking writer does not permanently corrupt the
//! store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use keytier_core::{EndUserId, KeyId, Role, Timestamp, UserId, Wallet};
use keytier_state::{KeyRecord, KeyStatus};

use crate::batch::{Expectation, WriteBatch, WriteOp};
use crate::error::StoreError;
use crate::log::{Cursor, Page, TransactionDraft, TransactionLog, TransactionRecord};
use crate::records::{EndUserRecord, UserRecord, Versioned};
use crate::{Directory, LedgerStore};

/// A key row with its commit version and creation sequence number.
///
/// The sequence number gives "first N eligible keys" a stable,
/// implementation-defined order: creation order.
#[derive(Debug)]
struct KeyRow {
    seq: u64,
    version: u64,
    record: KeyRecord,
}

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, UserRecord>,
    keys: HashMap<KeyId, KeyRow>,
    next_key_seq: u64,
    wallets: HashMap<UserId, Versioned<Wallet>>,
    end_users: HashMap<EndUserId, EndUserRecord>,
    log: TransactionLog,
}

/// Thread-safe, cloneable in-memory ledger store.
///
/// Cheaply cloneable via `Arc`; all clones share the same underlying
/// collections.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hierarchy participant.
    ///
    /// Validates the parent link against the hierarchy edge table and
    /// snapshots the ancestor chain onto the new record. The super-admin
    /// is registered without a parent; every other role requires a parent
    /// of exactly the role above it.
    pub fn register_user(
        &self,
        role: Role,
        display_name: &str,
        parent: Option<UserId>,
    ) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.write();

        let (parent_id, hierarchy) = match (role.parent(), parent) {
            (None, None) => (None, Vec::new()),
            (None, Some(_)) => {
                return Err(StoreError::InvalidHierarchy(format!(
                    "{role} does not take a parent"
                )))
            }
            (Some(_), None) => {
                return Err(StoreError::InvalidHierarchy(format!(
                    "{role} requires a parent"
                )))
            }
            (Some(expected), Some(pid)) => {
                let parent_record = inner.users.get(&pid).ok_or_else(|| StoreError::NotFound {
                    entity: format!("user {pid}"),
                })?;
                if parent_record.role != expected {
                    return Err(StoreError::InvalidHierarchy(format!(
                        "{role} requires a {expected} parent, got {}",
                        parent_record.role
                    )));
                }
                let mut chain = Vec::with_capacity(parent_record.hierarchy.len() + 1);
                chain.push(pid);
                chain.extend(parent_record.hierarchy.iter().copied());
                (Some(pid), chain)
            }
        };

        let record = UserRecord {
            id: UserId::new(),
            role,
            display_name: display_name.to_string(),
            parent: parent_id,
            hierarchy,
            created_at: Timestamp::now(),
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }
}

impl Inner {
    /// Validate every expectation in `batch` without writing anything.
    fn check_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        for op in batch.ops() {
            match op {
                WriteOp::PutKey { expect, record } => {
                    let current = self.keys.get(&record.id).map(|row| row.version);
                    check_expectation(*expect, current, || format!("key {}", record.id))?;
                }
                WriteOp::PutWallet { user, expect, .. } => {
                    let current = self.wallets.get(user).map(|w| w.version);
                    check_expectation(*expect, current, || format!("wallet {user}"))?;
                }
                WriteOp::PutEndUser { record } => {
                    if self.end_users.contains_key(&record.id) {
                        return Err(StoreError::AlreadyExists {
                            entity: format!("end user {}", record.id),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply a pre-validated batch.
    fn apply_batch(&mut self, batch: WriteBatch) {
        for op in batch.ops().iter().cloned() {
            match op {
                WriteOp::PutKey { expect, record } => match expect {
                    Expectation::Absent => {
                        let seq = self.next_key_seq;
                        self.next_key_seq += 1;
                        self.keys.insert(
                            record.id,
                            KeyRow {
                                seq,
                                version: 1,
                                record,
                            },
                        );
                    }
                    Expectation::Version(v) => {
                        if let Some(row) = self.keys.get_mut(&record.id) {
                            row.version = v + 1;
                            row.record = record;
                        }
                    }
                },
                WriteOp::PutWallet {
                    user,
                    expect,
                    wallet,
                } => {
                    let version = match expect {
                        Expectation::Absent => 1,
                        Expectation::Version(v) => v + 1,
                    };
                    self.wallets.insert(
                        user,
                        Versioned {
                            value: wallet,
                            version,
                        },
                    );
                }
                WriteOp::PutEndUser { record } => {
                    self.end_users.insert(record.id, record);
                }
            }
        }
    }
}

fn check_expectation(
    expect: Expectation,
    current: Option<u64>,
    entity: impl FnOnce() -> String,
) -> Result<(), StoreError> {
    let ok = match expect {
        Expectation::Absent => current.is_none(),
        Expectation::Version(v) => current == Some(v),
    };
    if ok {
        Ok(())
    } else {
        Err(StoreError::Conflict { entity: entity() })
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn key(&self, id: &KeyId) -> Result<Option<Versioned<KeyRecord>>, StoreError> {
        Ok(self.inner.read().keys.get(id).map(|row| Versioned {
            value: row.record.clone(),
            version: row.version,
        }))
    }

    async fn keys_assigned_to(
        &self,
        owner: &UserId,
        status: KeyStatus,
        limit: usize,
    ) -> Result<Vec<Versioned<KeyRecord>>, StoreError> {
        let inner = self.inner.read();
        let mut rows: Vec<&KeyRow> = inner
            .keys
            .values()
            .filter(|row| {
                row.record.assigned_to == Some(*owner) && row.record.status == status
            })
            .collect();
        rows.sort_by_key(|row| row.seq);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|row| Versioned {
                value: row.record.clone(),
                version: row.version,
            })
            .collect())
    }

    async fn list_keys(
        &self,
        owner: &UserId,
        status: Option<KeyStatus>,
        limit: usize,
    ) -> Result<Vec<KeyRecord>, StoreError> {
        let inner = self.inner.read();
        let mut rows: Vec<&KeyRow> = inner
            .keys
            .values()
            .filter(|row| {
                row.record.assigned_to == Some(*owner)
                    && status.map_or(true, |s| row.record.status == s)
            })
            .collect();
        rows.sort_by_key(|row| row.seq);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|row| row.record.clone())
            .collect())
    }

    async fn wallet(&self, user: &UserId) -> Result<Option<Versioned<Wallet>>, StoreError> {
        Ok(self.inner.read().wallets.get(user).map(|w| Versioned {
            value: w.value,
            version: w.version,
        }))
    }

    async fn end_user(&self, id: &EndUserId) -> Result<Option<EndUserRecord>, StoreError> {
        Ok(self.inner.read().end_users.get(id).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        inner.check_batch(&batch)?;
        let ops = batch.len();
        inner.apply_batch(batch);
        tracing::debug!(ops, "write batch committed");
        Ok(())
    }

    async fn append_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<TransactionRecord, StoreError> {
        self.inner.write().log.append(draft)
    }

    async fn transactions_for(
        &self,
        participant: &UserId,
        before: Option<Cursor>,
        limit: usize,
    ) -> Result<Page, StoreError> {
        Ok(self.inner.read().log.page_for(participant, before, limit))
    }
}

#[async_trait]
impl Directory for MemoryLedgerStore {
    async fn resolve(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.inner.read().users.get(id).cloned())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use keytier_state::UnlockCodeSet;
    use rand::rngs::OsRng;

    fn mint_key(creator: UserId) -> KeyRecord {
        KeyRecord::mint(
            KeyId::new(),
            creator,
            Timestamp::now(),
            None,
            UnlockCodeSet::generate(&mut OsRng),
        )
    }

    // ── Directory registration ───────────────────────────────────────

    #[tokio::test]
    async fn test_register_full_hierarchy() {
        let store = MemoryLedgerStore::new();
        let admin = store.register_user(Role::SuperAdmin, "root", None).unwrap();
        let sd = store
            .register_user(Role::SuperDistributor, "sd", Some(admin.id))
            .unwrap();
        let d = store
            .register_user(Role::Distributor, "d", Some(sd.id))
            .unwrap();
        let r = store.register_user(Role::Retailer, "r", Some(d.id)).unwrap();

        // Ancestor snapshot, nearest first.
        assert_eq!(r.hierarchy, vec![d.id, sd.id, admin.id]);
        assert_eq!(r.parent, Some(d.id));

        let resolved = store.resolve(&r.id).await.unwrap().unwrap();
        assert_eq!(resolved.role, Role::Retailer);
    }

    #[tokio::test]
    async fn test_register_rejects_wrong_parent_role() {
        let store = MemoryLedgerStore::new();
        let admin = store.register_user(Role::SuperAdmin, "root", None).unwrap();
        // A retailer's parent must be a distributor, not the super-admin.
        let result = store.register_user(Role::Retailer, "r", Some(admin.id));
        assert!(matches!(result, Err(StoreError::InvalidHierarchy(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_missing_parent() {
        let store = MemoryLedgerStore::new();
        let result = store.register_user(Role::Distributor, "d", None);
        assert!(matches!(result, Err(StoreError::InvalidHierarchy(_))));

        let result = store.register_user(Role::Distributor, "d", Some(UserId::new()));
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    // ── Commit semantics ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_commit_inserts_start_at_version_one() {
        let store = MemoryLedgerStore::new();
        let creator = UserId::new();
        let key = mint_key(creator);
        let key_id = key.id;

        let mut batch = WriteBatch::new();
        batch.put_key(Expectation::Absent, key);
        store.commit(batch).await.unwrap();

        let stored = store.key(&key_id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_commit_bumps_version() {
        let store = MemoryLedgerStore::new();
        let creator = UserId::new();
        let key = mint_key(creator);
        let key_id = key.id;

        let mut batch = WriteBatch::new();
        batch.put_key(Expectation::Absent, key);
        store.commit(batch).await.unwrap();

        let stored = store.key(&key_id).await.unwrap().unwrap();
        let mut batch = WriteBatch::new();
        batch.put_key(Expectation::Version(stored.version), stored.value);
        store.commit(batch).await.unwrap();

        assert_eq!(store.key(&key_id).await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_commit_rejects_stale_version() {
        let store = MemoryLedgerStore::new();
        let creator = UserId::new();
        let key = mint_key(creator);
        let key_id = key.id;

        let mut batch = WriteBatch::new();
        batch.put_key(Expectation::Absent, key);
        store.commit(batch).await.unwrap();

        // Two readers observe version 1.
        let a = store.key(&key_id).await.unwrap().unwrap();
        let b = store.key(&key_id).await.unwrap().unwrap();

        let mut first = WriteBatch::new();
        first.put_key(Expectation::Version(a.version), a.value);
        store.commit(first).await.unwrap();

        // The second writer's read set is now stale.
        let mut second = WriteBatch::new();
        second.put_key(Expectation::Version(b.version), b.value);
        let result = store.commit(second).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_failed_batch_applies_nothing() {
        let store = MemoryLedgerStore::new();
        let creator = UserId::new();
        let key = mint_key(creator);
        let key_id = key.id;

        let mut wallet = Wallet::new();
        wallet.credit(1).unwrap();

        // Wallet write is valid, key write expects a record that exists.
        let mut batch = WriteBatch::new();
        batch.put_wallet(creator, Expectation::Absent, wallet);
        batch.put_key(Expectation::Version(1), key);
        assert!(store.commit(batch).await.is_err());

        // Neither write landed.
        assert!(store.wallet(&creator).await.unwrap().is_none());
        assert!(store.key(&key_id).await.unwrap().is_none());
    }

    // ── Eligible-key selection ───────────────────────────────────────

    #[tokio::test]
    async fn test_keys_assigned_to_creation_order() {
        let store = MemoryLedgerStore::new();
        let creator = UserId::new();

        let mut minted = Vec::new();
        for _ in 0..5 {
            let key = mint_key(creator);
            minted.push(key.id);
            let mut batch = WriteBatch::new();
            batch.put_key(Expectation::Absent, key);
            store.commit(batch).await.unwrap();
        }

        let selected = store
            .keys_assigned_to(&creator, KeyStatus::Unassigned, 3)
            .await
            .unwrap();
        let ids: Vec<KeyId> = selected.iter().map(|v| v.value.id).collect();
        assert_eq!(ids, minted[..3].to_vec());
    }

    #[tokio::test]
    async fn test_keys_assigned_to_filters_status_and_owner() {
        let store = MemoryLedgerStore::new();
        let creator = UserId::new();
        let other = UserId::new();

        let key_a = mint_key(creator);
        let mut key_b = mint_key(creator);
        key_b
            .credit(creator, other, Role::SuperDistributor, Timestamp::now())
            .unwrap();

        let mut batch = WriteBatch::new();
        batch.put_key(Expectation::Absent, key_a);
        batch.put_key(Expectation::Absent, key_b);
        store.commit(batch).await.unwrap();

        let unassigned = store
            .keys_assigned_to(&creator, KeyStatus::Unassigned, 10)
            .await
            .unwrap();
        assert_eq!(unassigned.len(), 1);

        let credited = store
            .keys_assigned_to(&other, KeyStatus::Credited, 10)
            .await
            .unwrap();
        assert_eq!(credited.len(), 1);
    }

    #[tokio::test]
    async fn test_list_keys_optional_status_filter() {
        let store = MemoryLedgerStore::new();
        let creator = UserId::new();

        let key_a = mint_key(creator);
        let mut key_b = mint_key(creator);
        key_b
            .credit(UserId::new(), creator, Role::SuperAdmin, Timestamp::now())
            .unwrap();

        let mut batch = WriteBatch::new();
        batch.put_key(Expectation::Absent, key_a);
        batch.put_key(Expectation::Absent, key_b);
        store.commit(batch).await.unwrap();

        assert_eq!(store.list_keys(&creator, None, 10).await.unwrap().len(), 2);
        assert_eq!(
            store
                .list_keys(&creator, Some(KeyStatus::Credited), 10)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
