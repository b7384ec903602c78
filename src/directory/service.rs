use std::sync::Arc;

use crate::db::models::{Device, Sensor};
use crate::db::Store;
use crate::error::ServiceError;

/// Read-only projections over the device/sensor ownership chain. Both
/// listings are unbounded; per-device cardinalities are expected to stay
/// small.
#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn Store>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Devices owned by `user_id`. An unknown owner yields an empty list,
    /// not an error.
    pub async fn devices_for_user(&self, user_id: i64) -> Result<Vec<Device>, ServiceError> {
        Ok(self.store.devices_for_owner(user_id).await?)
    }

    /// Sensors attached to `mcu_id`. An unknown device yields an empty
    /// list, not an error.
    pub async fn sensors_for_device(&self, mcu_id: i64) -> Result<Vec<Sensor>, ServiceError> {
        Ok(self.store.sensors_for_device(mcu_id).await?)
    }
}
