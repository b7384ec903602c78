use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

/// A microcontroller acting as the gateway for its sensors and setpoints.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub place: String,
    pub owner_id: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Sensor {
    pub id: i64,
    pub mcu_id: i64,
    pub name: String,
    pub sensor_type: String,
    pub unit: Option<String>,
}

/// One timestamped measurement. Rows are append-only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub sensor_id: i64,
    pub value: f64,
    pub reading_time: DateTime<Utc>,
}

/// One logged setpoint command. Rows are append-only; the current setpoint
/// for a sensor is the newest row, not a stored field.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Setpoint {
    pub id: i64,
    pub mcu_id: i64,
    pub sensor_id: i64,
    pub user_id: i64,
    pub name: String,
    pub value: f64,
    pub set_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewDevice {
    pub name: String,
    pub place: String,
}

#[derive(Debug, Clone)]
pub struct NewSetpoint {
    pub mcu_id: i64,
    pub sensor_id: i64,
    pub user_id: i64,
    pub name: String,
    pub value: f64,
}
