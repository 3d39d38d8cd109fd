//! # Ledger Engine
//!
//! Orchestrates every ledger operation. Each operation follows the same
//! shape:
//!
//! 1. validate the actor's role and the arguments,
//! 2. read the affected records, capturing their commit versions,
//! 3. run the key state machine and wallet mutators on the copies,
//! 4. commit one version-checked [`WriteBatch`] — all-or-nothing,
//! 5. append one transaction record, outside the atomic boundary.
//!
//! A concurrent operation that mutated any record between steps 2 and 4
//! makes the commit fail with [`LedgerError::Conflict`]; the engine never
//! retries on the caller's behalf.

use rand::rngs::OsRng;

use keytier_core::{DeviceRecordId, EndUserId, KeyId, Role, Timestamp, UserId, Wallet};
use keytier_state::{KeyRecord, KeyStatus, UnlockCodeSet};
use keytier_store::{
    Cursor, DeviceRecord, DeviceStore, Directory, EndUserRecord, Expectation, LedgerStore, Page,
    TransactionAction, TransactionDraft, UserRecord, WriteBatch,
};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::provision::{EmiPlan, EndUserProfile};

/// An authenticated caller, as resolved by the external identity
/// provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Participant identifier.
    pub id: UserId,
    /// Authenticated role.
    pub role: Role,
}

/// The ledger engine over a primary store, an identity directory, and a
/// secondary device store.
pub struct LedgerEngine<S, I, D> {
    store: S,
    directory: I,
    devices: D,
    config: LedgerConfig,
}

impl<S, I, D> LedgerEngine<S, I, D>
where
    S: LedgerStore,
    I: Directory,
    D: DeviceStore,
{
    /// Create an engine with default limits.
    pub fn new(store: S, directory: I, devices: D) -> Self {
        Self::with_config(store, directory, devices, LedgerConfig::default())
    }

    /// Create an engine with explicit limits.
    pub fn with_config(store: S, directory: I, devices: D, config: LedgerConfig) -> Self {
        Self {
            store,
            directory,
            devices,
            config,
        }
    }

    // ─── Key creation ────────────────────────────────────────────────

    /// Mint `count` new keys into the caller's wallet.
    ///
    /// Super-admin only. `validity_in_months == 0` means no expiry.
    /// Returns the new key ids in creation order.
    pub async fn create_keys(
        &self,
        actor: Actor,
        count: u32,
        validity_in_months: u32,
    ) -> Result<Vec<KeyId>, LedgerError> {
        if actor.role != Role::SuperAdmin {
            return Err(LedgerError::Forbidden(format!(
                "{} cannot create keys",
                actor.role
            )));
        }
        if count == 0 || count > self.config.max_keys_per_create {
            return Err(LedgerError::InvalidArgument(format!(
                "count must be between 1 and {}, got {count}",
                self.config.max_keys_per_create
            )));
        }

        let now = Timestamp::now();
        let valid_until = if validity_in_months > 0 {
            Some(now.checked_add_months(validity_in_months).ok_or_else(|| {
                LedgerError::InvalidArgument(format!(
                    "validity of {validity_in_months} months out of range"
                ))
            })?)
        } else {
            None
        };

        let (mut wallet, wallet_expect) = self.read_wallet_or_default(&actor.id).await?;
        wallet.credit(u64::from(count))?;

        let mut batch = WriteBatch::new();
        let mut key_ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let key = KeyRecord::mint(
                KeyId::new(),
                actor.id,
                now,
                valid_until,
                UnlockCodeSet::generate(&mut OsRng),
            );
            key_ids.push(key.id);
            batch.put_key(Expectation::Absent, key);
        }
        batch.put_wallet(actor.id, wallet_expect, wallet);

        self.store.commit(batch).await?;
        tracing::info!(user = %actor.id, count, "keys created");

        self.append_log(TransactionDraft {
            action: TransactionAction::Created,
            key_ids: key_ids.clone(),
            from_user: None,
            from_role: None,
            to_user: Some(actor.id),
            to_role: Some(Role::SuperAdmin),
            performed_by: actor.id,
            end_user: None,
            reason: None,
        })
        .await;

        Ok(key_ids)
    }

    // ─── Key transfer ────────────────────────────────────────────────

    /// Transfer the first `count` eligible keys from the caller to a
    /// direct child in the hierarchy.
    ///
    /// All-or-nothing: if fewer than `count` eligible keys exist, nothing
    /// moves.
    pub async fn transfer_keys(
        &self,
        actor: Actor,
        to: UserId,
        count: u32,
    ) -> Result<Vec<KeyId>, LedgerError> {
        if count == 0 {
            return Err(LedgerError::InvalidArgument(
                "transfer count must be positive".into(),
            ));
        }

        let recipient = self.resolve_user(&to).await?;
        if !actor.role.can_transfer_to(recipient.role) {
            return Err(LedgerError::Forbidden(format!(
                "{} cannot transfer to {}",
                actor.role, recipient.role
            )));
        }

        let spendable = KeyStatus::spendable_for(actor.role);
        let eligible = self
            .store
            .keys_assigned_to(&actor.id, spendable, count as usize)
            .await?;
        if eligible.len() < count as usize {
            return Err(LedgerError::InsufficientInventory {
                requested: u64::from(count),
                available: eligible.len() as u64,
            });
        }

        let now = Timestamp::now();
        let mut batch = WriteBatch::new();
        let mut key_ids = Vec::with_capacity(eligible.len());
        for versioned in eligible {
            let mut key = versioned.value;
            key.credit(actor.id, to, recipient.role, now)?;
            key_ids.push(key.id);
            batch.put_key(Expectation::Version(versioned.version), key);
        }

        let mut sender_wallet = self.read_wallet_required(&actor.id).await?;
        sender_wallet.value.debit_transfer(u64::from(count))?;
        batch.put_wallet(
            actor.id,
            Expectation::Version(sender_wallet.version),
            sender_wallet.value,
        );

        // Upsert: the recipient may not have a wallet yet.
        let (mut recipient_wallet, recipient_expect) = self.read_wallet_or_default(&to).await?;
        recipient_wallet.credit(u64::from(count))?;
        batch.put_wallet(to, recipient_expect, recipient_wallet);

        self.store.commit(batch).await?;
        tracing::info!(from = %actor.id, to = %to, count, "keys transferred");

        self.append_log(TransactionDraft {
            action: TransactionAction::Credited,
            key_ids: key_ids.clone(),
            from_user: Some(actor.id),
            from_role: Some(actor.role),
            to_user: Some(to),
            to_role: Some(recipient.role),
            performed_by: actor.id,
            end_user: None,
            reason: None,
        })
        .await;

        Ok(key_ids)
    }

    // ─── Key revocation ──────────────────────────────────────────────

    /// Revoke the first `count` eligible keys out of `target`'s wallet.
    ///
    /// Super-admin only. All-or-nothing, matching transfer: zero eligible
    /// keys is `NotFound`, fewer than requested is
    /// `InsufficientInventory`.
    pub async fn revoke_keys(
        &self,
        actor: Actor,
        target: UserId,
        count: u32,
        reason: Option<String>,
    ) -> Result<Vec<KeyId>, LedgerError> {
        if actor.role != Role::SuperAdmin {
            return Err(LedgerError::Forbidden(format!(
                "{} cannot revoke keys",
                actor.role
            )));
        }
        if count == 0 {
            return Err(LedgerError::InvalidArgument(
                "revoke count must be positive".into(),
            ));
        }

        let owner = self.resolve_user(&target).await?;
        let spendable = KeyStatus::spendable_for(owner.role);
        let eligible = self
            .store
            .keys_assigned_to(&target, spendable, count as usize)
            .await?;
        if eligible.is_empty() {
            return Err(LedgerError::NotFound(format!(
                "no revocable keys held by {target}"
            )));
        }
        if eligible.len() < count as usize {
            return Err(LedgerError::InsufficientInventory {
                requested: u64::from(count),
                available: eligible.len() as u64,
            });
        }

        let now = Timestamp::now();
        let mut batch = WriteBatch::new();
        let mut key_ids = Vec::with_capacity(eligible.len());
        for versioned in eligible {
            let mut key = versioned.value;
            key.revoke(now)?;
            key_ids.push(key.id);
            batch.put_key(Expectation::Version(versioned.version), key);
        }

        let mut wallet = self.read_wallet_required(&target).await?;
        wallet.value.debit_revoke(u64::from(count))?;
        batch.put_wallet(target, Expectation::Version(wallet.version), wallet.value);

        self.store.commit(batch).await?;
        tracing::info!(target = %target, by = %actor.id, count, "keys revoked");

        self.append_log(TransactionDraft {
            action: TransactionAction::Revoked,
            key_ids: key_ids.clone(),
            from_user: Some(target),
            from_role: Some(owner.role),
            to_user: None,
            to_role: None,
            performed_by: actor.id,
            end_user: None,
            reason,
        })
        .await;

        Ok(key_ids)
    }

    // ─── Key provisioning ────────────────────────────────────────────

    /// Bind a credited key to a new end user with an EMI plan.
    ///
    /// Retailer only; the key must be credited to the caller. The
    /// end-user record, key flip, and wallet debit commit atomically.
    /// The device-store write is best-effort: if it fails, the primary
    /// state stands and [`LedgerError::PartialFailure`] carries the new
    /// end-user id for reconciliation.
    pub async fn provision_key(
        &self,
        actor: Actor,
        key_id: KeyId,
        profile: EndUserProfile,
        plan: EmiPlan,
    ) -> Result<EndUserId, LedgerError> {
        if actor.role != Role::Retailer {
            return Err(LedgerError::Forbidden(format!(
                "{} cannot provision keys",
                actor.role
            )));
        }
        profile.validate()?;

        let versioned = self
            .store
            .key(&key_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("key {key_id}")))?;
        let mut key = versioned.value;
        if key.assigned_to != Some(actor.id) || key.status != KeyStatus::Credited {
            return Err(LedgerError::Forbidden(format!(
                "key {key_id} is not credited to {}",
                actor.id
            )));
        }

        let now = Timestamp::now();
        let schedule = plan.into_schedule()?;
        let end_user_id = EndUserId::new();

        key.provision(end_user_id, now)?;

        let mut wallet = self.read_wallet_required(&actor.id).await?;
        wallet.value.debit_provision(1)?;

        let end_user = EndUserRecord {
            id: end_user_id,
            name: profile.name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            device: profile.device.clone(),
            key_id,
            emi: schedule,
            retailer: actor.id,
            created_at: now,
        };

        let mut batch = WriteBatch::new();
        batch.put_key(Expectation::Version(versioned.version), key);
        batch.put_wallet(actor.id, Expectation::Version(wallet.version), wallet.value);
        batch.put_end_user(end_user);

        self.store.commit(batch).await?;
        tracing::info!(retailer = %actor.id, key = %key_id, end_user = %end_user_id, "key provisioned");

        // Best-effort secondary write; the primary commit stands either way.
        let device_result = self
            .devices
            .put_device(DeviceRecord {
                id: DeviceRecordId::new(),
                end_user: end_user_id,
                key_id,
                device: profile.device,
                locked: false,
                created_at: now,
            })
            .await;

        self.append_log(TransactionDraft {
            action: TransactionAction::Provisioned,
            key_ids: vec![key_id],
            from_user: Some(actor.id),
            from_role: Some(Role::Retailer),
            to_user: None,
            to_role: Some(Role::EndUser),
            performed_by: actor.id,
            end_user: Some(end_user_id),
            reason: None,
        })
        .await;

        if let Err(e) = device_result {
            tracing::warn!(end_user = %end_user_id, error = %e, "device record write failed after commit");
            return Err(LedgerError::PartialFailure {
                end_user: end_user_id,
                detail: format!("device record write failed: {e}"),
            });
        }

        Ok(end_user_id)
    }

    // ─── Queries ─────────────────────────────────────────────────────

    /// One page of the caller's transaction history, newest first.
    pub async fn list_transactions(
        &self,
        caller: UserId,
        cursor: Option<Cursor>,
        page_size: Option<usize>,
    ) -> Result<Page, LedgerError> {
        let limit = self.config.page_size(page_size);
        Ok(self.store.transactions_for(&caller, cursor, limit).await?)
    }

    /// A participant's wallet counters. Participants that have not
    /// touched a key yet report all-zero counters.
    pub async fn wallet(&self, user: UserId) -> Result<Wallet, LedgerError> {
        self.resolve_user(&user).await?;
        Ok(self
            .store
            .wallet(&user)
            .await?
            .map(|v| v.value)
            .unwrap_or_default())
    }

    /// A participant's key inventory in creation order, optionally
    /// filtered by status. Read-only; the limit is clamped to the
    /// configured page cap.
    pub async fn list_keys(
        &self,
        owner: UserId,
        status: Option<KeyStatus>,
        limit: Option<usize>,
    ) -> Result<Vec<KeyRecord>, LedgerError> {
        let limit = self.config.page_size(limit);
        Ok(self.store.list_keys(&owner, status, limit).await?)
    }

    // ─── Helpers ─────────────────────────────────────────────────────

    async fn resolve_user(&self, id: &UserId) -> Result<UserRecord, LedgerError> {
        self.directory
            .resolve(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("user {id}")))
    }

    async fn read_wallet_required(
        &self,
        user: &UserId,
    ) -> Result<keytier_store::Versioned<Wallet>, LedgerError> {
        self.store.wallet(user).await?.ok_or_else(|| {
            // Eligible keys exist but the wallet does not: a concurrent
            // commit (or an out-of-band mutation) broke the read set.
            LedgerError::Conflict(format!("wallet for {user} missing"))
        })
    }

    async fn read_wallet_or_default(
        &self,
        user: &UserId,
    ) -> Result<(Wallet, Expectation), LedgerError> {
        Ok(match self.store.wallet(user).await? {
            Some(v) => (v.value, Expectation::Version(v.version)),
            None => (Wallet::new(), Expectation::Absent),
        })
    }

    /// Append outside the atomic boundary. Failure is logged, never
    /// propagated: the primary commit already stands.
    async fn append_log(&self, draft: TransactionDraft) {
        if let Err(e) = self.store.append_transaction(draft).await {
            tracing::error!(error = %e, "transaction log append failed after commit");
        }
    }
}
