//! # Provisioning Inputs
//!
//! Input types for binding a credited key to an end user: the end-user
//! profile and the EMI installment plan. Validation happens here, before
//! the engine touches any store; the computed schedule is what gets
//! persisted.
//!
//! Monetary amounts are `i64` minor currency units. There is no float
//! anywhere in a plan.

use serde::{Deserialize, Serialize};

use keytier_core::Timestamp;
use keytier_store::{DeviceIdentifiers, EmiSchedule};

use crate::error::LedgerError;

/// Days between consecutive installments.
const INSTALLMENT_INTERVAL_DAYS: i64 = 30;

/// Profile of the end user a key is being provisioned for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndUserProfile {
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Identifiers of the device being provisioned.
    pub device: DeviceIdentifiers,
}

impl EndUserProfile {
    /// Validate required fields.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::InvalidArgument("end-user name is required".into()));
        }
        if self.email.trim().is_empty() {
            return Err(LedgerError::InvalidArgument("end-user email is required".into()));
        }
        if self.device.imei.trim().is_empty() {
            return Err(LedgerError::InvalidArgument("device imei is required".into()));
        }
        Ok(())
    }
}

/// An EMI installment plan as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiPlan {
    /// First installment date.
    pub start_date: Timestamp,
    /// Number of installments.
    pub installments_left: u32,
    /// Per-installment amount, minor currency units.
    pub monthly_installment: i64,
    /// Total plan amount, minor currency units.
    pub total_amount: i64,
    /// Up-front payment, minor currency units.
    pub down_payment: i64,
}

impl EmiPlan {
    /// Validate amounts and counts.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.installments_left == 0 {
            return Err(LedgerError::InvalidArgument(
                "installments_left must be at least 1".into(),
            ));
        }
        if self.monthly_installment < 0 || self.total_amount < 0 || self.down_payment < 0 {
            return Err(LedgerError::InvalidArgument(
                "plan amounts must be non-negative".into(),
            ));
        }
        if self.down_payment > self.total_amount {
            return Err(LedgerError::InvalidArgument(
                "down_payment exceeds total_amount".into(),
            ));
        }
        Ok(())
    }

    /// Compute the stored schedule: the outstanding amount and the first
    /// installment due date.
    pub fn into_schedule(self) -> Result<EmiSchedule, LedgerError> {
        self.validate()?;
        let next_installment_date = self
            .start_date
            .checked_add_days(INSTALLMENT_INTERVAL_DAYS)
            .ok_or_else(|| LedgerError::InvalidArgument("start_date out of range".into()))?;
        Ok(EmiSchedule {
            start_date: self.start_date,
            installments_left: self.installments_left,
            monthly_installment: self.monthly_installment,
            total_amount: self.total_amount,
            down_payment: self.down_payment,
            amount_left: self.total_amount - self.down_payment,
            next_installment_date,
        })
    }
}
