use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::db::repository::{self, SearchRow};
use crate::error::AppError;
use crate::models::{SearchResponse, SearchResult};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;
const MIN_QUERY_LEN: usize = 2;

/// Free-text search over students, classes and attendance, newest first.
pub async fn search(
    db: &SqlitePool,
    query: Option<&str>,
    limit: Option<i64>,
) -> Result<SearchResponse, AppError> {
    let query = query.map(str::trim).unwrap_or_default();
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(AppError::Validation(
            "Search query must be at least 2 characters long".to_string(),
        ));
    }
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let results: Vec<SearchResult> = repository::search(db, query, limit)
        .await?
        .into_iter()
        .map(into_result)
        .collect();

    Ok(SearchResponse {
        query: query.to_string(),
        total: results.len(),
        results,
    })
}

fn into_result(row: SearchRow) -> SearchResult {
    // attendance rows carry their raw date as subtitle
    let subtitle = if row.kind == "attendance" {
        NaiveDate::parse_from_str(&row.subtitle, "%Y-%m-%d")
            .map(|d| d.format("%b %d, %Y").to_string())
            .unwrap_or(row.subtitle)
    } else {
        row.subtitle
    };

    SearchResult {
        id: row.id,
        kind: row.kind,
        title: row.title,
        subtitle,
        description: row.description,
        created_at: row.created_at,
    }
}
