use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::OpenApi;

use super::{
    dto::{
        DeviceDto, LoginRequest, LoginResponse, MessageResponse, ReadingDto, RegisterRequest,
        SensorDto, SetpointBatchRequest, SetpointDto, SetpointItem,
    },
    errors::ApiError,
    AppState,
};
use crate::setpoints::SetpointCommand;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OwnerParams {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceParams {
    pub mcu_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SensorParams {
    pub sensor_id: Option<String>,
}

/// Absent or non-numeric ids behave like a lookup that matches nothing, so
/// the read endpoints answer them with an empty list.
fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.parse().ok())
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Registers a new account and assigns its default microcontroller.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created with its default MCU", body = MessageResponse),
        (status = 400, description = "A required field is missing or empty"),
        (status = 409, description = "Username already taken"),
    ),
    tag = "accounts"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .accounts
        .register(&req.username, &req.password, &req.email)
        .await?;
    Ok(Json(MessageResponse {
        message: "Registration successful! MCU assigned.".to_owned(),
    }))
}

/// Verifies credentials and returns the account id. No session is created.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown username"),
    ),
    tag = "accounts"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user_id = state.accounts.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse {
        message: "Login successful".to_owned(),
        user_id,
    }))
}

// ---------------------------------------------------------------------------
// Device & sensor directory
// ---------------------------------------------------------------------------

/// Lists the devices owned by a user.
#[utoipa::path(
    get,
    path = "/api/devices",
    params(("user_id" = Option<String>, Query, description = "Owner account id")),
    responses(
        (status = 200, description = "Devices owned by the user", body = Vec<DeviceDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "devices"
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(params): Query<OwnerParams>,
) -> Result<Json<Vec<DeviceDto>>, ApiError> {
    let Some(user_id) = parse_id(params.user_id.as_deref()) else {
        return Ok(Json(Vec::new()));
    };
    let devices = state.directory.devices_for_user(user_id).await?;
    Ok(Json(devices.into_iter().map(Into::into).collect()))
}

/// Lists the sensors attached to a device.
#[utoipa::path(
    get,
    path = "/api/sensors",
    params(("mcu_id" = Option<String>, Query, description = "Device id")),
    responses(
        (status = 200, description = "Sensors attached to the device", body = Vec<SensorDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "devices"
)]
pub async fn list_sensors(
    State(state): State<AppState>,
    Query(params): Query<DeviceParams>,
) -> Result<Json<Vec<SensorDto>>, ApiError> {
    let Some(mcu_id) = parse_id(params.mcu_id.as_deref()) else {
        return Ok(Json(Vec::new()));
    };
    let sensors = state.directory.sensors_for_device(mcu_id).await?;
    Ok(Json(sensors.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Fetches the most recent reading for a sensor as a 0-or-1-element array,
/// for uniformity with the other list endpoints.
#[utoipa::path(
    get,
    path = "/api/sensor_readings",
    params(("sensor_id" = Option<String>, Query, description = "Sensor id")),
    responses(
        (status = 200, description = "Most recent reading, if any", body = Vec<ReadingDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "telemetry"
)]
pub async fn latest_reading(
    State(state): State<AppState>,
    Query(params): Query<SensorParams>,
) -> Result<Json<Vec<ReadingDto>>, ApiError> {
    let Some(sensor_id) = parse_id(params.sensor_id.as_deref()) else {
        return Ok(Json(Vec::new()));
    };
    let reading = state.telemetry.latest_reading(sensor_id).await?;
    Ok(Json(reading.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Setpoints
// ---------------------------------------------------------------------------

/// Appends a batch of setpoint commands for a device, all-or-nothing.
#[utoipa::path(
    post,
    path = "/api/set_point",
    request_body = SetpointBatchRequest,
    responses(
        (status = 200, description = "Batch appended to the command log", body = MessageResponse),
        (status = 500, description = "Store failure; no rows were written"),
    ),
    tag = "setpoints"
)]
pub async fn submit_setpoints(
    State(state): State<AppState>,
    Json(req): Json<SetpointBatchRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let commands = req
        .setpoints
        .into_iter()
        .map(|SetpointItem { sensor_id, name, value }| SetpointCommand {
            sensor_id,
            name,
            value,
        })
        .collect();
    state
        .setpoints
        .submit(req.mcu_id, req.user_id, commands)
        .await?;
    Ok(Json(MessageResponse {
        message: "Set points saved successfully!".to_owned(),
    }))
}

/// Fetches the 100 most recent setpoint commands for a device, newest
/// first.
#[utoipa::path(
    get,
    path = "/api/setpoints",
    params(("mcu_id" = Option<String>, Query, description = "Device id")),
    responses(
        (status = 200, description = "Setpoint history, newest first", body = Vec<SetpointDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "setpoints"
)]
pub async fn setpoint_history(
    State(state): State<AppState>,
    Query(params): Query<DeviceParams>,
) -> Result<Json<Vec<SetpointDto>>, ApiError> {
    let Some(mcu_id) = parse_id(params.mcu_id.as_deref()) else {
        return Ok(Json(Vec::new()));
    };
    let setpoints = state.setpoints.history(mcu_id).await?;
    Ok(Json(setpoints.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        login,
        list_devices,
        list_sensors,
        latest_reading,
        submit_setpoints,
        setpoint_history,
        health
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        MessageResponse,
        LoginResponse,
        SetpointBatchRequest,
        SetpointItem,
        DeviceDto,
        SensorDto,
        ReadingDto,
        SetpointDto
    )),
    tags(
        (name = "accounts",  description = "Registration and login"),
        (name = "devices",   description = "Device and sensor directory"),
        (name = "telemetry", description = "Latest sensor readings"),
        (name = "setpoints", description = "Setpoint command log"),
        (name = "system",    description = "System endpoints"),
    ),
    info(
        title = "IoT Dashboard Backend API",
        version = "0.1.0",
        description = "REST API for the IoT telemetry dashboard"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};

    use crate::api::{router, AppState};
    use crate::db::mem::MemStore;

    fn test_server(store: Arc<MemStore>) -> TestServer {
        TestServer::new(router(AppState::new(store))).unwrap()
    }

    async fn register(server: &TestServer, username: &str, password: &str) {
        let resp = server
            .post("/api/register")
            .json(&json!({
                "username": username,
                "password": password,
                "email": format!("{username}@example.com"),
            }))
            .await;
        resp.assert_status_ok();
    }

    async fn login_id(server: &TestServer, username: &str, password: &str) -> i64 {
        let resp = server
            .post("/api/login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        resp.assert_status_ok();
        resp.json::<Value>()["user_id"].as_i64().unwrap()
    }

    // -----------------------------------------------------------------------
    // POST /api/register
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn register_assigns_default_mcu() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store.clone());

        register(&server, "alice", "hunter2").await;
        let user_id = login_id(&server, "alice", "hunter2").await;

        let resp = server
            .get("/api/devices")
            .add_query_param("user_id", user_id)
            .await;
        resp.assert_status_ok();

        let devices: Vec<Value> = resp.json();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0]["name"], "alice's MCU");
        assert_eq!(devices[0]["place"], "Not specified");
        assert_eq!(devices[0]["owner_id"], user_id);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store.clone());

        register(&server, "alice", "hunter2").await;

        let resp = server
            .post("/api/register")
            .json(&json!({
                "username": "alice",
                "password": "other",
                "email": "alice2@example.com",
            }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::CONFLICT);
        let body: Value = resp.json();
        assert_eq!(body["error"], "Username already exists.");
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn empty_password_is_rejected_with_no_partial_state() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store.clone());

        let resp = server
            .post("/api/register")
            .json(&json!({
                "username": "alice",
                "password": "",
                "email": "alice@example.com",
            }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert_eq!(body["error"], "All fields are required.");
        assert_eq!(store.user_count().await, 0);
        assert_eq!(store.device_count().await, 0);
    }

    #[tokio::test]
    async fn absent_field_is_rejected_like_an_empty_one() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store.clone());

        let resp = server
            .post("/api/register")
            .json(&json!({ "username": "alice", "password": "hunter2" }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(store.user_count().await, 0);
    }

    // -----------------------------------------------------------------------
    // POST /api/login
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn login_returns_the_id_produced_at_registration() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store.clone());

        register(&server, "alice", "hunter2").await;
        let first = login_id(&server, "alice", "hunter2").await;
        let second = login_id(&server, "alice", "hunter2").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store.clone());

        register(&server, "alice", "hunter2").await;

        let resp = server
            .post("/api/login")
            .json(&json!({ "username": "alice", "password": "wrongpass" }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = resp.json();
        assert_eq!(body["error"], "Incorrect password");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store.clone());

        let resp = server
            .post("/api/login")
            .json(&json!({ "username": "nobody", "password": "x" }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
        let body: Value = resp.json();
        assert_eq!(body["error"], "User not found");
    }

    // -----------------------------------------------------------------------
    // GET /api/devices and /api/sensors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn device_listing_is_empty_for_absent_or_garbage_ids() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store);

        let resp = server.get("/api/devices").await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>(), json!([]));

        let resp = server
            .get("/api/devices")
            .add_query_param("user_id", "not-a-number")
            .await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>(), json!([]));
    }

    #[tokio::test]
    async fn sensor_listing_is_scoped_to_the_device() {
        let store = Arc::new(MemStore::new());
        let mcu_id = store.seed_device(1, "greenhouse", "roof").await;
        let other = store.seed_device(1, "garage", "garage").await;
        store
            .seed_sensor(mcu_id, "air temp", "temperature", Some("C"))
            .await;
        store
            .seed_sensor(mcu_id, "air humidity", "humidity", Some("%"))
            .await;
        store.seed_sensor(other, "door", "contact", None).await;

        let server = test_server(store);
        let resp = server
            .get("/api/sensors")
            .add_query_param("mcu_id", mcu_id)
            .await;
        resp.assert_status_ok();

        let sensors: Vec<Value> = resp.json();
        assert_eq!(sensors.len(), 2);
        assert!(sensors.iter().all(|s| s["mcu_id"] == json!(mcu_id)));
    }

    // -----------------------------------------------------------------------
    // GET /api/sensor_readings
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn latest_reading_returns_only_the_newest_row() {
        let store = Arc::new(MemStore::new());
        let mcu_id = store.seed_device(1, "greenhouse", "roof").await;
        let sensor_id = store
            .seed_sensor(mcu_id, "air temp", "temperature", Some("C"))
            .await;

        let t3 = Utc::now();
        store.seed_reading(sensor_id, 20.0, t3 - Duration::minutes(2)).await;
        store.seed_reading(sensor_id, 21.0, t3 - Duration::minutes(1)).await;
        store.seed_reading(sensor_id, 22.5, t3).await;

        let server = test_server(store);
        let resp = server
            .get("/api/sensor_readings")
            .add_query_param("sensor_id", sensor_id)
            .await;
        resp.assert_status_ok();

        let readings: Vec<Value> = resp.json();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0]["value"], 22.5);
        assert_eq!(readings[0]["sensor_id"], json!(sensor_id));
    }

    #[tokio::test]
    async fn sensor_without_readings_yields_an_empty_array() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store);

        let resp = server
            .get("/api/sensor_readings")
            .add_query_param("sensor_id", 42)
            .await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>(), json!([]));
    }

    // -----------------------------------------------------------------------
    // POST /api/set_point and GET /api/setpoints
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn setpoint_batch_is_logged_and_listed_newest_first() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store.clone());

        let resp = server
            .post("/api/set_point")
            .json(&json!({
                "mcu_id": 1,
                "user_id": 1,
                "setpoints": [
                    { "sensor_id": 5, "name": "temp", "value": 22 },
                    { "sensor_id": 6, "name": "hum",  "value": 40 },
                ],
            }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["message"], "Set points saved successfully!");
        assert_eq!(store.setpoint_count().await, 2);

        let resp = server
            .get("/api/setpoints")
            .add_query_param("mcu_id", 1)
            .await;
        resp.assert_status_ok();

        let rows: Vec<Value> = resp.json();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "hum");
        assert_eq!(rows[1]["name"], "temp");
        assert!(rows.iter().all(|r| r["user_id"] == json!(1)));
    }

    #[tokio::test]
    async fn empty_setpoint_batch_is_a_no_op_success() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store.clone());

        let resp = server
            .post("/api/set_point")
            .json(&json!({ "mcu_id": 1, "user_id": 1, "setpoints": [] }))
            .await;
        resp.assert_status_ok();
        assert_eq!(store.setpoint_count().await, 0);
    }

    #[tokio::test]
    async fn setpoint_history_is_capped_at_100_newest_rows() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store);

        for i in 0..150 {
            let resp = server
                .post("/api/set_point")
                .json(&json!({
                    "mcu_id": 1,
                    "user_id": 1,
                    "setpoints": [
                        { "sensor_id": 5, "name": format!("sp{i}"), "value": i },
                    ],
                }))
                .await;
            resp.assert_status_ok();
        }

        let resp = server
            .get("/api/setpoints")
            .add_query_param("mcu_id", 1)
            .await;
        resp.assert_status_ok();

        let rows: Vec<Value> = resp.json();
        assert_eq!(rows.len(), 100);
        assert_eq!(rows[0]["name"], "sp149");
        assert_eq!(rows[99]["name"], "sp50");
    }

    // -----------------------------------------------------------------------
    // GET /health and /api-docs/openapi.json
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_returns_ok() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store);

        let resp = server.get("/health").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn openapi_spec_is_served() {
        let store = Arc::new(MemStore::new());
        let server = test_server(store);

        let resp = server.get("/api-docs/openapi.json").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["info"]["title"], "IoT Dashboard Backend API");
    }
}
