use super::{create, typed, AppState, CreatedResponse};
use crate::error::Result;
use crate::schema::Announcement;
use crate::store::{Filter, Stored};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

/// Only published announcements ever leave the server.
pub async fn list_announcements(State(state): State<AppState>) -> Result<Json<Vec<Announcement>>> {
    let documents = state
        .gateway
        .get_documents(Announcement::COLLECTION, Some(Filter::eq("published", true)))
        .await?;
    Ok(Json(typed(documents)?))
}

pub async fn create_announcement(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    create::<Announcement>(&state, body).await
}
