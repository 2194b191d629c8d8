use super::{create, AppState, CreatedResponse};
use crate::error::Result;
use crate::schema::Registration;
use crate::store::Stored;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct RegistrationList {
    pub items: Vec<Map<String, Value>>,
}

/// Raw stored documents, `_id` included as a string.
pub async fn list_registrations(State(state): State<AppState>) -> Result<Json<RegistrationList>> {
    let items = state
        .gateway
        .get_documents(Registration::COLLECTION, None)
        .await?;
    Ok(Json(RegistrationList { items }))
}

pub async fn create_registration(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    create::<Registration>(&state, body).await
}
