pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    accounts::AccountService, db::Store, directory::DirectoryService,
    setpoints::SetpointService, telemetry::TelemetryService,
};
use handlers::ApiDoc;

/// Shared handler state: one service per API area, all over the same
/// injected store.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub directory: DirectoryService,
    pub telemetry: TelemetryService,
    pub setpoints: SetpointService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            directory: DirectoryService::new(store.clone()),
            telemetry: TelemetryService::new(store.clone()),
            setpoints: SetpointService::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    // Dashboard frontends send credentialed requests, which rules out the
    // wildcard origin; mirror the caller's origin instead.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/devices", get(handlers::list_devices))
        .route("/api/sensors", get(handlers::list_sensors))
        .route("/api/sensor_readings", get(handlers::latest_reading))
        .route("/api/set_point", post(handlers::submit_setpoints))
        .route("/api/setpoints", get(handlers::setpoint_history))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(cors)
}
