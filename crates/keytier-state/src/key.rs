//! # Key Lifecycle State Machine
//!
//! Models the lifecycle of one distributable key from minting through
//! provisioning or revocation.
//!
//! ## States
//!
//! ```text
//! Unassigned ──▶ Credited ──▶ Credited ──▶ ... ──▶ Provisioned (terminal)
//!     │              │
//!     └──────────────┴──▶ Revoked (terminal)
//! ```
//!
//! ## Ownership Invariant
//!
//! Exactly one of the following holds at any time:
//! - `Unassigned` and assigned to its creator,
//! - `Credited` or `Provisioned` and assigned to some participant,
//! - `Revoked` and assigned to nobody.
//!
//! [`KeyRecord::invariant_holds`] checks this shape; the transition methods
//! preserve it by construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use keytier_core::{EndUserId, KeyId, Role, Timestamp, UserId};

use crate::unlock::UnlockCodeSet;

// ─── Key Status ──────────────────────────────────────────────────────

/// The lifecycle status of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// Freshly minted, still held by its creator.
    Unassigned,
    /// Transferred to a participant's inventory.
    Credited,
    /// Consumed by end-user provisioning (terminal).
    Provisioned,
    /// Revoked out of circulation (terminal).
    Revoked,
}

impl KeyStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Provisioned | Self::Revoked)
    }

    /// The status a key must hold to be spent (transferred or revoked)
    /// out of a wallet owned by `owner_role`.
    ///
    /// A super-admin spends freshly minted `Unassigned` keys; every other
    /// tier spends keys that were `Credited` to it.
    pub fn spendable_for(owner_role: Role) -> KeyStatus {
        match owner_role {
            Role::SuperAdmin => Self::Unassigned,
            _ => Self::Credited,
        }
    }
}

impl std::fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unassigned => "UNASSIGNED",
            Self::Credited => "CREDITED",
            Self::Provisioned => "PROVISIONED",
            Self::Revoked => "REVOKED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors that can occur during key lifecycle transitions.
#[derive(Error, Debug)]
pub enum KeyStateError {
    /// Attempted transition is not valid from the current status.
    #[error("invalid key transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Attempted target status.
        to: String,
    },
}

// ─── Key Record ──────────────────────────────────────────────────────

/// One distributable key with its status and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Key identifier.
    pub id: KeyId,
    /// Current lifecycle status.
    pub status: KeyStatus,
    /// Current owner. `None` only after revocation.
    pub assigned_to: Option<UserId>,
    /// Role of the current owner, mirroring `assigned_to`.
    pub assigned_role: Option<Role>,
    /// The super-admin who minted this key.
    pub created_by: UserId,
    /// Mint instant.
    pub created_at: Timestamp,
    /// Expiry instant, if the key was minted with a validity window.
    pub valid_until: Option<Timestamp>,
    /// The key's own 12-code unlock set, immutable after minting.
    pub unlock_codes: UnlockCodeSet,
    /// Sender of the most recent transfer.
    pub transferred_from: Option<UserId>,
    /// Instant of the most recent transfer.
    pub transferred_at: Option<Timestamp>,
    /// Instant the key was consumed by provisioning.
    pub provisioned_at: Option<Timestamp>,
    /// End user the key was provisioned to.
    pub end_user: Option<EndUserId>,
    /// Instant the key was revoked.
    pub revoked_at: Option<Timestamp>,
}

impl KeyRecord {
    /// Mint a new key held by its creator.
    pub fn mint(
        id: KeyId,
        created_by: UserId,
        created_at: Timestamp,
        valid_until: Option<Timestamp>,
        unlock_codes: UnlockCodeSet,
    ) -> Self {
        Self {
            id,
            status: KeyStatus::Unassigned,
            assigned_to: Some(created_by),
            assigned_role: Some(Role::SuperAdmin),
            created_by,
            created_at,
            valid_until,
            unlock_codes,
            transferred_from: None,
            transferred_at: None,
            provisioned_at: None,
            end_user: None,
            revoked_at: None,
        }
    }

    /// Credit the key to a recipient (UNASSIGNED/CREDITED → CREDITED).
    ///
    /// Stamps the transfer provenance. The caller is responsible for
    /// checking that `from` currently owns the key; this method only
    /// enforces the status machine.
    pub fn credit(
        &mut self,
        from: UserId,
        to: UserId,
        to_role: Role,
        at: Timestamp,
    ) -> Result<(), KeyStateError> {
        if self.status.is_terminal() {
            return Err(self.rejected("CREDITED"));
        }
        self.status = KeyStatus::Credited;
        self.assigned_to = Some(to);
        self.assigned_role = Some(to_role);
        self.transferred_from = Some(from);
        self.transferred_at = Some(at);
        Ok(())
    }

    /// Revoke the key (UNASSIGNED/CREDITED → REVOKED).
    ///
    /// Clears ownership; the key leaves circulation permanently.
    pub fn revoke(&mut self, at: Timestamp) -> Result<(), KeyStateError> {
        if self.status.is_terminal() {
            return Err(self.rejected("REVOKED"));
        }
        self.status = KeyStatus::Revoked;
        self.assigned_to = None;
        self.assigned_role = None;
        self.revoked_at = Some(at);
        Ok(())
    }

    /// Consume the key for an end user (CREDITED → PROVISIONED).
    pub fn provision(&mut self, end_user: EndUserId, at: Timestamp) -> Result<(), KeyStateError> {
        if self.status != KeyStatus::Credited {
            return Err(self.rejected("PROVISIONED"));
        }
        self.status = KeyStatus::Provisioned;
        self.provisioned_at = Some(at);
        self.end_user = Some(end_user);
        Ok(())
    }

    /// Whether the key's validity window has elapsed at `now`.
    ///
    /// Keys without a validity window never expire. Expiry is a derived
    /// view, not a status transition.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.valid_until.is_some_and(|until| now >= until)
    }

    /// Whether the ownership invariant holds for the current status.
    pub fn invariant_holds(&self) -> bool {
        match self.status {
            KeyStatus::Unassigned => {
                self.assigned_to == Some(self.created_by)
                    && self.assigned_role == Some(Role::SuperAdmin)
            }
            KeyStatus::Credited | KeyStatus::Provisioned => {
                self.assigned_to.is_some() && self.assigned_role.is_some()
            }
            KeyStatus::Revoked => self.assigned_to.is_none() && self.assigned_role.is_none(),
        }
    }

    fn rejected(&self, to: &str) -> KeyStateError {
        KeyStateError::InvalidTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unlock::UnlockCodeSet;
    use rand::rngs::OsRng;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn mint() -> (KeyRecord, UserId) {
        let creator = UserId::new();
        let key = KeyRecord::mint(
            KeyId::new(),
            creator,
            ts("2026-01-01T00:00:00Z"),
            None,
            UnlockCodeSet::generate(&mut OsRng),
        );
        (key, creator)
    }

    // ── Happy-path lifecycle ─────────────────────────────────────────

    #[test]
    fn test_mint_shape() {
        let (key, creator) = mint();
        assert_eq!(key.status, KeyStatus::Unassigned);
        assert_eq!(key.assigned_to, Some(creator));
        assert_eq!(key.assigned_role, Some(Role::SuperAdmin));
        assert!(key.invariant_holds());
    }

    #[test]
    fn test_credit_stamps_provenance() {
        let (mut key, creator) = mint();
        let recipient = UserId::new();
        let at = ts("2026-01-02T00:00:00Z");
        key.credit(creator, recipient, Role::SuperDistributor, at)
            .unwrap();

        assert_eq!(key.status, KeyStatus::Credited);
        assert_eq!(key.assigned_to, Some(recipient));
        assert_eq!(key.assigned_role, Some(Role::SuperDistributor));
        assert_eq!(key.transferred_from, Some(creator));
        assert_eq!(key.transferred_at, Some(at));
        assert!(key.invariant_holds());
    }

    #[test]
    fn test_credit_chains_down_the_hierarchy() {
        let (mut key, creator) = mint();
        let sd = UserId::new();
        let d = UserId::new();
        key.credit(creator, sd, Role::SuperDistributor, ts("2026-01-02T00:00:00Z"))
            .unwrap();
        key.credit(sd, d, Role::Distributor, ts("2026-01-03T00:00:00Z"))
            .unwrap();

        assert_eq!(key.assigned_to, Some(d));
        assert_eq!(key.transferred_from, Some(sd));
        assert!(key.invariant_holds());
    }

    #[test]
    fn test_revoke_from_unassigned() {
        let (mut key, _) = mint();
        key.revoke(ts("2026-01-05T00:00:00Z")).unwrap();
        assert_eq!(key.status, KeyStatus::Revoked);
        assert_eq!(key.assigned_to, None);
        assert_eq!(key.assigned_role, None);
        assert!(key.invariant_holds());
    }

    #[test]
    fn test_revoke_from_credited() {
        let (mut key, creator) = mint();
        key.credit(creator, UserId::new(), Role::SuperDistributor, ts("2026-01-02T00:00:00Z"))
            .unwrap();
        key.revoke(ts("2026-01-05T00:00:00Z")).unwrap();
        assert_eq!(key.status, KeyStatus::Revoked);
        assert!(key.invariant_holds());
    }

    #[test]
    fn test_provision_from_credited() {
        let (mut key, creator) = mint();
        let retailer = UserId::new();
        key.credit(creator, retailer, Role::Retailer, ts("2026-01-02T00:00:00Z"))
            .unwrap();

        let end_user = EndUserId::new();
        let at = ts("2026-01-06T00:00:00Z");
        key.provision(end_user, at).unwrap();

        assert_eq!(key.status, KeyStatus::Provisioned);
        assert_eq!(key.end_user, Some(end_user));
        assert_eq!(key.provisioned_at, Some(at));
        // Ownership is retained for audit.
        assert_eq!(key.assigned_to, Some(retailer));
        assert!(key.invariant_holds());
    }

    // ── Invalid transitions ──────────────────────────────────────────

    #[test]
    fn test_cannot_provision_unassigned() {
        let (mut key, _) = mint();
        assert!(key.provision(EndUserId::new(), ts("2026-01-06T00:00:00Z")).is_err());
    }

    #[test]
    fn test_cannot_credit_after_revoke() {
        let (mut key, creator) = mint();
        key.revoke(ts("2026-01-05T00:00:00Z")).unwrap();
        let result = key.credit(creator, UserId::new(), Role::SuperDistributor, ts("2026-01-06T00:00:00Z"));
        assert!(result.is_err());
    }

    #[test]
    fn test_cannot_revoke_twice() {
        let (mut key, _) = mint();
        key.revoke(ts("2026-01-05T00:00:00Z")).unwrap();
        assert!(key.revoke(ts("2026-01-06T00:00:00Z")).is_err());
    }

    #[test]
    fn test_cannot_provision_after_provision() {
        let (mut key, creator) = mint();
        key.credit(creator, UserId::new(), Role::Retailer, ts("2026-01-02T00:00:00Z"))
            .unwrap();
        key.provision(EndUserId::new(), ts("2026-01-06T00:00:00Z")).unwrap();
        assert!(key.provision(EndUserId::new(), ts("2026-01-07T00:00:00Z")).is_err());
    }

    // ── Spendable status ─────────────────────────────────────────────

    #[test]
    fn test_spendable_status_by_role() {
        assert_eq!(KeyStatus::spendable_for(Role::SuperAdmin), KeyStatus::Unassigned);
        assert_eq!(KeyStatus::spendable_for(Role::SuperDistributor), KeyStatus::Credited);
        assert_eq!(KeyStatus::spendable_for(Role::Distributor), KeyStatus::Credited);
        assert_eq!(KeyStatus::spendable_for(Role::Retailer), KeyStatus::Credited);
    }

    // ── Expiry derivation ────────────────────────────────────────────

    #[test]
    fn test_no_validity_never_expires() {
        let (key, _) = mint();
        assert!(!key.is_expired(ts("2099-01-01T00:00:00Z")));
    }

    #[test]
    fn test_expiry_is_derived() {
        let creator = UserId::new();
        let key = KeyRecord::mint(
            KeyId::new(),
            creator,
            ts("2026-01-01T00:00:00Z"),
            Some(ts("2026-07-01T00:00:00Z")),
            UnlockCodeSet::generate(&mut OsRng),
        );
        assert!(!key.is_expired(ts("2026-06-30T23:59:59Z")));
        assert!(key.is_expired(ts("2026-07-01T00:00:00Z")));
        // Expiry never mutates the stored status.
        assert_eq!(key.status, KeyStatus::Unassigned);
    }

    // ── Display & serde ──────────────────────────────────────────────

    #[test]
    fn test_status_display() {
        assert_eq!(KeyStatus::Unassigned.to_string(), "UNASSIGNED");
        assert_eq!(KeyStatus::Credited.to_string(), "CREDITED");
        assert_eq!(KeyStatus::Provisioned.to_string(), "PROVISIONED");
        assert_eq!(KeyStatus::Revoked.to_string(), "REVOKED");
    }

    #[test]
    fn test_key_serde_roundtrip() {
        let (key, _) = mint();
        let json = serde_json::to_string(&key).unwrap();
        let parsed: KeyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, key.id);
        assert_eq!(parsed.status, key.status);
        assert_eq!(parsed.unlock_codes, key.unlock_codes);
    }
}
