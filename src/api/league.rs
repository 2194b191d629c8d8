use super::{create, typed, AppState, CreatedResponse};
use crate::error::Result;
use crate::schema::League;
use crate::store::Stored;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

pub async fn list_leagues(State(state): State<AppState>) -> Result<Json<Vec<League>>> {
    let documents = state.gateway.get_documents(League::COLLECTION, None).await?;
    Ok(Json(typed(documents)?))
}

pub async fn create_league(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    create::<League>(&state, body).await
}
