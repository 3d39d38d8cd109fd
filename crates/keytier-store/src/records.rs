//! # Stored Record Types
//!
//! Record types the store persists besides keys and wallets: hierarchy
//! participants, provisioned end users with their installment schedules,
//! and the device control records written to the secondary store.
//!
//! Monetary amounts are `i64` minor currency units throughout — floats are
//! never stored for money.

use serde::{Deserialize, Serialize};

use keytier_core::{DeviceRecordId, EndUserId, KeyId, Role, Timestamp, UserId};

/// A value read from the store together with its commit version.
///
/// The version participates in optimistic concurrency: a write batch that
/// expects version `n` commits only if no other batch has bumped the
/// record past `n` in the meantime.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    /// The stored value.
    pub value: T,
    /// Monotonic per-record commit version, starting at 1.
    pub version: u64,
}

/// A hierarchy participant as known to the identity directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Participant identifier.
    pub id: UserId,
    /// Tier in the distribution hierarchy.
    pub role: Role,
    /// Human-readable name.
    pub display_name: String,
    /// Direct parent in the hierarchy. `None` only for the super-admin.
    pub parent: Option<UserId>,
    /// Denormalized ancestor ids, nearest first, snapshotted at
    /// registration time.
    pub hierarchy: Vec<UserId>,
    /// Registration instant.
    pub created_at: Timestamp,
}

/// Identifiers of the device a key is provisioned onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentifiers {
    /// Primary IMEI.
    pub imei: String,
    /// Device serial number.
    pub serial: String,
    /// Device model string.
    pub model: String,
}

/// Computed installment schedule attached to an end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmiSchedule {
    /// First installment date.
    pub start_date: Timestamp,
    /// Installments remaining.
    pub installments_left: u32,
    /// Per-installment amount, minor currency units.
    pub monthly_installment: i64,
    /// Total plan amount, minor currency units.
    pub total_amount: i64,
    /// Up-front payment, minor currency units.
    pub down_payment: i64,
    /// `total_amount - down_payment`, minor currency units.
    pub amount_left: i64,
    /// Due date of the next installment (`start_date + 30 days`).
    pub next_installment_date: Timestamp,
}

/// A provisioned end user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndUserRecord {
    /// End-user identifier.
    pub id: EndUserId,
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// The provisioned device.
    pub device: DeviceIdentifiers,
    /// The key consumed for this end user.
    pub key_id: KeyId,
    /// Installment schedule.
    pub emi: EmiSchedule,
    /// The retailer who provisioned the key.
    pub retailer: UserId,
    /// Provisioning instant.
    pub created_at: Timestamp,
}

/// Device control record written to the secondary store.
///
/// Written best-effort after the primary provisioning commit; see the
/// engine's provisioning documentation for the consistency boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Generated record identifier.
    pub id: DeviceRecordId,
    /// The end user the device belongs to.
    pub end_user: EndUserId,
    /// The key provisioned onto the device.
    pub key_id: KeyId,
    /// Device identifiers.
    pub device: DeviceIdentifiers,
    /// Whether the device is currently locked.
    pub locked: bool,
    /// Creation instant.
    pub created_at: Timestamp,
}
