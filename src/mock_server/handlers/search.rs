//! Search handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{not_found, page_response};
use crate::mock_server::state::MockState;

/// Query parameters for searches.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/search/{text|advanced}/{page}?q=
pub async fn search(
    State(state): State<Arc<RwLock<MockState>>>,
    Path((kind, page)): Path<(String, u32)>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let Some(q) = query.q.filter(|q| !q.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Validation error",
                "message": "Missing query parameter: q"
            })),
        )
            .into_response();
    };

    let state = state.read().await;
    let maps = match kind.as_str() {
        "text" => state.search_text(&q),
        "advanced" => state.search_advanced(&q),
        other => return not_found(format!("Unknown search type: {other}")),
    };
    page_response(state.paginate(maps, page), &q, page)
}
