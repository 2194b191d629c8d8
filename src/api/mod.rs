//! HTTP endpoints
//!
//! - GET  / and /api/hello       - liveness messages
//! - GET  /test                  - best-effort store diagnostics
//! - GET  /api/league            - league settings
//! - POST /api/league            - create league settings
//! - GET  /api/announcements     - published announcements
//! - POST /api/announcements     - create an announcement
//! - GET  /api/registrations     - raw registrations with string ids
//! - POST /api/register          - register a player or team

mod announcements;
mod diagnostics;
mod league;
mod registrations;
mod root;

pub use announcements::{create_announcement, list_announcements};
pub use diagnostics::{test_database, DiagnosticsResponse};
pub use league::{create_league, list_leagues};
pub use registrations::{create_registration, list_registrations, RegistrationList};
pub use root::{hello, read_root, MessageResponse};

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::schema::{Record, ValidationError};
use crate::store::{Gateway, Stored, ID_FIELD};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    /// Whether DATABASE_URL / DATABASE_NAME were provided, for diagnostics
    pub database_url_set: bool,
    pub database_name_set: bool,
}

impl AppState {
    pub fn new(gateway: Gateway, config: &Config) -> Self {
        Self {
            gateway,
            database_url_set: config.database_url.is_some(),
            database_name_set: config.database_name.is_some(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(read_root))
        .route("/api/hello", get(hello))
        .route("/test", get(test_database))
        .route("/api/league", get(list_leagues).post(create_league))
        .route(
            "/api/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/api/registrations", get(list_registrations))
        .route("/api/register", axum::routing::post(create_registration))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// Turns a body extraction failure into a validation failure on `body`.
fn payload(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ValidationError::single("body", "invalid_json", rejection.body_text()).into()),
    }
}

/// Validates a payload and stores it. Nothing is written unless every
/// field passes.
async fn create<R: Stored + Send + Sync>(
    state: &AppState,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let record = R::validate(&payload(body)?)?;
    let id = state.gateway.create_document(R::COLLECTION, &record).await?;

    info!("Created {} {}", R::KIND, id);

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Reads stored documents back through their record type.
fn typed<R: Record>(documents: Vec<Map<String, Value>>) -> Result<Vec<R>> {
    documents
        .into_iter()
        .map(|mut doc| {
            let id = match doc.remove(ID_FIELD) {
                Some(Value::String(id)) => id,
                _ => String::new(),
            };
            R::validate(&Value::Object(doc)).map_err(|source| ApiError::CorruptDocument {
                kind: R::KIND,
                id,
                source,
            })
        })
        .collect()
}
