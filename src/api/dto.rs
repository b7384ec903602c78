use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::{Device, Reading, Sensor, Setpoint};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Registration payload. Fields left out of the JSON body deserialize to
/// empty strings and are rejected by validation, so a missing field is a
/// 400 rather than a deserialization failure.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for `POST /api/set_point`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetpointBatchRequest {
    pub mcu_id: i64,
    pub user_id: i64,
    pub setpoints: Vec<SetpointItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetpointItem {
    pub sensor_id: i64,
    pub name: String,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceDto {
    pub id: i64,
    pub name: String,
    pub place: String,
    pub owner_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorDto {
    pub id: i64,
    pub mcu_id: i64,
    pub name: String,
    pub sensor_type: String,
    pub unit: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingDto {
    pub id: i64,
    pub sensor_id: i64,
    pub value: f64,
    pub reading_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetpointDto {
    pub id: i64,
    pub mcu_id: i64,
    pub sensor_id: i64,
    pub user_id: i64,
    pub name: String,
    pub value: f64,
    pub set_time: DateTime<Utc>,
}

impl From<Device> for DeviceDto {
    fn from(d: Device) -> Self {
        Self {
            id: d.id,
            name: d.name,
            place: d.place,
            owner_id: d.owner_id,
        }
    }
}

impl From<Sensor> for SensorDto {
    fn from(s: Sensor) -> Self {
        Self {
            id: s.id,
            mcu_id: s.mcu_id,
            name: s.name,
            sensor_type: s.sensor_type,
            unit: s.unit,
        }
    }
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            id: r.id,
            sensor_id: r.sensor_id,
            value: r.value,
            reading_time: r.reading_time,
        }
    }
}

impl From<Setpoint> for SetpointDto {
    fn from(s: Setpoint) -> Self {
        Self {
            id: s.id,
            mcu_id: s.mcu_id,
            sensor_id: s.sensor_id,
            user_id: s.user_id,
            name: s.name,
            value: s.value,
            set_time: s.set_time,
        }
    }
}
