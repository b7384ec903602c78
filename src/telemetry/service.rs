use std::sync::Arc;

use crate::db::models::Reading;
use crate::db::Store;
use crate::error::ServiceError;

#[derive(Clone)]
pub struct TelemetryService {
    store: Arc<dyn Store>,
}

impl TelemetryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Most recent reading for the sensor, or `None` when the sensor is
    /// unknown or has produced no readings yet.
    pub async fn latest_reading(&self, sensor_id: i64) -> Result<Option<Reading>, ServiceError> {
        Ok(self.store.latest_reading(sensor_id).await?)
    }
}
