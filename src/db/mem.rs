use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::models::{Device, NewDevice, NewSetpoint, NewUser, Reading, Sensor, Setpoint, User};
use super::{Store, StoreError};

/// In-memory [`Store`] used by the test suite and database-free development
/// runs. Mirrors the Postgres implementation's semantics, including the
/// uniqueness constraint on usernames and the newest-first tiebreak by row
/// id.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    devices: Vec<Device>,
    sensors: Vec<Sensor>,
    readings: Vec<Reading>,
    setpoints: Vec<Setpoint>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a device row directly, bypassing registration.
    pub async fn seed_device(&self, owner_id: i64, name: &str, place: &str) -> i64 {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        inner.devices.push(Device {
            id,
            name: name.to_owned(),
            place: place.to_owned(),
            owner_id,
        });
        id
    }

    pub async fn seed_sensor(
        &self,
        mcu_id: i64,
        name: &str,
        sensor_type: &str,
        unit: Option<&str>,
    ) -> i64 {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        inner.sensors.push(Sensor {
            id,
            mcu_id,
            name: name.to_owned(),
            sensor_type: sensor_type.to_owned(),
            unit: unit.map(str::to_owned),
        });
        id
    }

    pub async fn seed_reading(
        &self,
        sensor_id: i64,
        value: f64,
        reading_time: DateTime<Utc>,
    ) -> i64 {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        inner.readings.push(Reading {
            id,
            sensor_id,
            value,
            reading_time,
        });
        id
    }

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn device_count(&self) -> usize {
        self.inner.read().await.devices.len()
    }

    pub async fn setpoint_count(&self) -> usize {
        self.inner.read().await.setpoints.len()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user_with_device(
        &self,
        user: NewUser,
        device: NewDevice,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation);
        }

        let user_id = inner.next_id();
        inner.users.push(User {
            id: user_id,
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
        });

        let device_id = inner.next_id();
        inner.devices.push(Device {
            id: device_id,
            name: device.name,
            place: device.place,
            owner_id: user_id,
        });

        Ok(user_id)
    }

    async fn devices_for_owner(&self, owner_id: i64) -> Result<Vec<Device>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .devices
            .iter()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn sensors_for_device(&self, mcu_id: i64) -> Result<Vec<Sensor>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sensors
            .iter()
            .filter(|s| s.mcu_id == mcu_id)
            .cloned()
            .collect())
    }

    async fn latest_reading(&self, sensor_id: i64) -> Result<Option<Reading>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .readings
            .iter()
            .filter(|r| r.sensor_id == sensor_id)
            .max_by_key(|r| (r.reading_time, r.id))
            .cloned())
    }

    async fn append_setpoints(&self, rows: Vec<NewSetpoint>) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let written = rows.len() as u64;

        let set_time = Utc::now();
        for row in rows {
            let id = inner.next_id();
            inner.setpoints.push(Setpoint {
                id,
                mcu_id: row.mcu_id,
                sensor_id: row.sensor_id,
                user_id: row.user_id,
                name: row.name,
                value: row.value,
                set_time,
            });
        }

        Ok(written)
    }

    async fn setpoint_history(&self, mcu_id: i64, limit: i64) -> Result<Vec<Setpoint>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Setpoint> = inner
            .setpoints
            .iter()
            .filter(|s| s.mcu_id == mcu_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| std::cmp::Reverse((s.set_time, s.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}
