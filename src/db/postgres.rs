use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{Device, NewDevice, NewSetpoint, NewUser, Reading, Sensor, Setpoint, User};
use super::{Store, StoreError};

/// Postgres-backed [`Store`] over a shared connection pool. Connections are
/// checked out per operation and returned on every exit path by the pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, email FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user_with_device(
        &self,
        user: NewUser,
        device: NewDevice,
    ) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, email) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_insert_err)?;

        sqlx::query("INSERT INTO microcontrollers (name, place, owner_id) VALUES ($1, $2, $3)")
            .bind(&device.name)
            .bind(&device.place)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user_id)
    }

    async fn devices_for_owner(&self, owner_id: i64) -> Result<Vec<Device>, StoreError> {
        let devices = sqlx::query_as::<_, Device>(
            "SELECT id, name, place, owner_id FROM microcontrollers \
             WHERE owner_id = $1 ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    async fn sensors_for_device(&self, mcu_id: i64) -> Result<Vec<Sensor>, StoreError> {
        let sensors = sqlx::query_as::<_, Sensor>(
            "SELECT id, mcu_id, name, sensor_type, unit FROM sensors \
             WHERE mcu_id = $1 ORDER BY id",
        )
        .bind(mcu_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sensors)
    }

    async fn latest_reading(&self, sensor_id: i64) -> Result<Option<Reading>, StoreError> {
        let reading = sqlx::query_as::<_, Reading>(
            "SELECT id, sensor_id, value, reading_time FROM sensor_readings \
             WHERE sensor_id = $1 ORDER BY reading_time DESC, id DESC LIMIT 1",
        )
        .bind(sensor_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reading)
    }

    async fn append_setpoints(&self, rows: Vec<NewSetpoint>) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        for row in &rows {
            sqlx::query(
                "INSERT INTO setpoints (mcu_id, sensor_id, user_id, name, value) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(row.mcu_id)
            .bind(row.sensor_id)
            .bind(row.user_id)
            .bind(&row.name)
            .bind(row.value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    async fn setpoint_history(&self, mcu_id: i64, limit: i64) -> Result<Vec<Setpoint>, StoreError> {
        let setpoints = sqlx::query_as::<_, Setpoint>(
            "SELECT id, mcu_id, sensor_id, user_id, name, value, set_time FROM setpoints \
             WHERE mcu_id = $1 ORDER BY set_time DESC, id DESC LIMIT $2",
        )
        .bind(mcu_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(setpoints)
    }
}
