//! HTTP request handlers for the mock server.

pub mod downloads;
pub mod maps;
pub mod search;
pub mod users;
pub mod votes;

pub use downloads::*;
pub use maps::*;
pub use search::*;
pub use users::*;
pub use votes::*;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::mock_server::state::PageSlice;
use crate::BeatmapData;

/// Wire shape of a listing page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub docs: Vec<BeatmapData>,
    pub total_docs: u64,
    pub last_page: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl From<PageSlice> for PageResponse {
    fn from(slice: PageSlice) -> Self {
        Self {
            docs: slice.docs,
            total_docs: slice.total_docs,
            last_page: slice.last_page,
            prev_page: slice.prev_page,
            next_page: slice.next_page,
        }
    }
}

pub(crate) fn not_found(message: String) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Not Found",
            "message": message
        })),
    )
        .into_response()
}

pub(crate) fn page_response(
    slice: Option<PageSlice>,
    what: &str,
    page: u32,
) -> axum::response::Response {
    match slice {
        Some(slice) => (StatusCode::OK, Json(PageResponse::from(slice))).into_response(),
        None => not_found(format!("No page {page} for {what}")),
    }
}
