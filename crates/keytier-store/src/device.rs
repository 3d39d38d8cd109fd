//! # In-Memory Device Store
//!
//! Secondary store for device control records. Provisioning writes here
//! best-effort after its primary commit; the engine surfaces a failure as
//! a partial completion for manual reconciliation, never as a rollback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use keytier_core::DeviceRecordId;

use crate::error::StoreError;
use crate::records::DeviceRecord;
use crate::DeviceStore;

/// Thread-safe, cloneable in-memory device store.
#[derive(Clone, Default)]
pub struct MemoryDeviceStore {
    data: Arc<RwLock<HashMap<DeviceRecordId, DeviceRecord>>>,
}

impl MemoryDeviceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of device records held.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn put_device(&self, record: DeviceRecord) -> Result<(), StoreError> {
        self.data.write().insert(record.id, record);
        Ok(())
    }

    async fn device(&self, id: &DeviceRecordId) -> Result<Option<DeviceRecord>, StoreError> {
        Ok(self.data.read().get(id).cloned())
    }
}
