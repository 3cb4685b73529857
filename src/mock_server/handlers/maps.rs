//! Beatmap listing and lookup handlers.

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
use crate::{AutomapperQuery, ListingType};

/// Query parameters for listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub automapper: Option<String>,
}

/// GET /api/maps/{kind}/{arg}
///
/// `kind` is a listing name (with `arg` the page index), `key` or `hash`.
pub async fn get_maps(
    State(state): State<Arc<RwLock<MockState>>>,
    Path((kind, arg)): Path<(String, String)>,
    Query(query): Query<ListingQuery>,
) -> Response {
    let state = state.read().await;

    match kind.as_str() {
        "key" => match state.get_by_key(&arg) {
            Some(beatmap) => (StatusCode::OK, Json(beatmap.clone())).into_response(),
            None => not_found(format!("No beatmap with key: {arg}")),
        },
        "hash" => match state.get_by_hash(&arg) {
            Some(beatmap) => (StatusCode::OK, Json(beatmap.clone())).into_response(),
            None => not_found(format!("No beatmap with hash: {arg}")),
        },
        other => {
            let (Some(listing), Ok(page)) =
                (ListingType::from_segment(other), arg.parse::<u32>())
            else {
                return not_found(format!("Unknown route: maps/{other}/{arg}"));
            };
            let automappers = AutomapperQuery::from_query_value(query.automapper.as_deref());
            let maps = state.listing(listing, automappers);
            page_response(state.paginate(maps, page), other, page)
        }
    }
}

/// GET /api/maps/uploader/{user_id}/{page}
pub async fn get_uploader_maps(
    State(state): State<Arc<RwLock<MockState>>>,
    Path((kind, user_id, page)): Path<(String, String, u32)>,
) -> Response {
    if kind != "uploader" {
        return not_found(format!("Unknown route: maps/{kind}"));
    }

    let state = state.read().await;
    let maps = state.uploaded_by(&user_id);
    page_response(state.paginate(maps, page), &user_id, page)
}
