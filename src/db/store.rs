use async_trait::async_trait;
use thiserror::Error;

use super::models::{Device, NewDevice, NewSetpoint, NewUser, Reading, Sensor, Setpoint, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violation")]
    UniqueViolation,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence seam shared by every service.
///
/// The store executes parameterized operations and owns the transaction
/// boundaries of the two multi-statement sequences (registration and
/// setpoint batches); business rules live in the services on top.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Inserts the user and their default device in one transaction and
    /// returns the new user id. A username collision surfaces as
    /// [`StoreError::UniqueViolation`]; on any failure neither row is
    /// visible.
    async fn create_user_with_device(
        &self,
        user: NewUser,
        device: NewDevice,
    ) -> Result<i64, StoreError>;

    async fn devices_for_owner(&self, owner_id: i64) -> Result<Vec<Device>, StoreError>;

    async fn sensors_for_device(&self, mcu_id: i64) -> Result<Vec<Sensor>, StoreError>;

    /// The row with the greatest `reading_time` for the sensor, ties broken
    /// by row id.
    async fn latest_reading(&self, sensor_id: i64) -> Result<Option<Reading>, StoreError>;

    /// Appends the whole batch in one transaction and returns the number of
    /// rows written. All-or-nothing: a failed insert aborts the batch.
    async fn append_setpoints(&self, rows: Vec<NewSetpoint>) -> Result<u64, StoreError>;

    /// Newest-first setpoint rows for the device, at most `limit` of them.
    async fn setpoint_history(&self, mcu_id: i64, limit: i64) -> Result<Vec<Setpoint>, StoreError>;
}
