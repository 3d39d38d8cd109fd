//! # Wallet Counters
//!
//! Per-participant key counters. A wallet summarizes key inflow and
//! outflow for one hierarchy participant and is mutated only by the ledger
//! engine, atomically with the key-state change it accounts for.
//!
//! ## Invariant
//!
//! After every successful mutation:
//!
//! ```text
//! available_keys = total_keys_received
//!                − total_keys_transferred
//!                − total_provisioned
//!                − total_revoked
//! ```
//!
//! The mutators below compute all new counter values with checked
//! arithmetic before writing any of them, so a failed mutation leaves the
//! wallet untouched.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Key counters for one hierarchy participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Keys currently spendable (transferable or provisionable).
    pub available_keys: u64,
    /// Lifetime keys received (minted for, or transferred to, this participant).
    pub total_keys_received: u64,
    /// Lifetime keys transferred onward to a child tier.
    pub total_keys_transferred: u64,
    /// Lifetime keys consumed by end-user provisioning.
    pub total_provisioned: u64,
    /// Lifetime keys revoked out of this wallet.
    pub total_revoked: u64,
}

impl Wallet {
    /// An empty wallet with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an inflow of `count` keys (mint or incoming transfer).
    pub fn credit(&mut self, count: u64) -> Result<(), CoreError> {
        let received = self
            .total_keys_received
            .checked_add(count)
            .ok_or(CoreError::CounterOverflow {
                counter: "total_keys_received",
            })?;
        let available = self
            .available_keys
            .checked_add(count)
            .ok_or(CoreError::CounterOverflow {
                counter: "available_keys",
            })?;
        self.total_keys_received = received;
        self.available_keys = available;
        Ok(())
    }

    /// Record an outgoing transfer of `count` keys.
    pub fn debit_transfer(&mut self, count: u64) -> Result<(), CoreError> {
        let available = self
            .available_keys
            .checked_sub(count)
            .ok_or(CoreError::CounterUnderflow {
                counter: "available_keys",
            })?;
        let transferred = self
            .total_keys_transferred
            .checked_add(count)
            .ok_or(CoreError::CounterOverflow {
                counter: "total_keys_transferred",
            })?;
        self.available_keys = available;
        self.total_keys_transferred = transferred;
        Ok(())
    }

    /// Record `count` keys consumed by provisioning.
    pub fn debit_provision(&mut self, count: u64) -> Result<(), CoreError> {
        let available = self
            .available_keys
            .checked_sub(count)
            .ok_or(CoreError::CounterUnderflow {
                counter: "available_keys",
            })?;
        let provisioned = self
            .total_provisioned
            .checked_add(count)
            .ok_or(CoreError::CounterOverflow {
                counter: "total_provisioned",
            })?;
        self.available_keys = available;
        self.total_provisioned = provisioned;
        Ok(())
    }

    /// Record `count` keys revoked out of this wallet.
    pub fn debit_revoke(&mut self, count: u64) -> Result<(), CoreError> {
        let available = self
            .available_keys
            .checked_sub(count)
            .ok_or(CoreError::CounterUnderflow {
                counter: "available_keys",
            })?;
        let revoked = self
            .total_revoked
            .checked_add(count)
            .ok_or(CoreError::CounterOverflow {
                counter: "total_revoked",
            })?;
        self.available_keys = available;
        self.total_revoked = revoked;
        Ok(())
    }

    /// Whether the wallet invariant holds.
    pub fn is_balanced(&self) -> bool {
        self.total_keys_received
            .checked_sub(self.total_keys_transferred)
            .and_then(|v| v.checked_sub(self.total_provisioned))
            .and_then(|v| v.checked_sub(self.total_revoked))
            == Some(self.available_keys)
    }
}
