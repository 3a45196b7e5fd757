use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::SearchResponse;
use crate::services::search as search_service;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    q: Option<String>,
    limit: Option<i64>,
}

pub(super) async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Query(query) = query?;
    let response = search_service::search(&state.db, query.q.as_deref(), query.limit).await?;
    Ok(Json(response))
}
