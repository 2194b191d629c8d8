use super::AppState;
use crate::error::truncate_chars;
use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;

/// Collection names listed at most
const MAX_LISTED_COLLECTIONS: usize = 10;
/// Store error text kept in the status line
const MAX_STATUS_CHARS: usize = 50;

#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

/// Probes the store and reports what it finds. Never fails: store errors
/// become status text.
pub async fn test_database(State(state): State<AppState>) -> Json<DiagnosticsResponse> {
    let store = state.gateway.store();

    let (database, connection_status, collections) = match store.collection_names().await {
        Ok(mut names) => {
            names.truncate(MAX_LISTED_COLLECTIONS);
            (
                format!("Connected & Working ({})", store.database_name()),
                "Connected",
                names,
            )
        }
        Err(e) => {
            warn!("Diagnostics probe failed: {}", e);
            (
                format!("Error: {}", truncate_chars(&e.to_string(), MAX_STATUS_CHARS)),
                "Not Connected",
                Vec::new(),
            )
        }
    };

    Json(DiagnosticsResponse {
        backend: "Running".to_string(),
        database,
        database_url: set_or_not(state.database_url_set),
        database_name: set_or_not(state.database_name_set),
        connection_status: connection_status.to_string(),
        collections,
    })
}

fn set_or_not(set: bool) -> String {
    let text = if set { "Set" } else { "Not Set" };
    text.to_string()
}
