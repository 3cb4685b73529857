//! Archive and cover image handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;

use super::not_found;
use crate::mock_server::fixtures::Fixtures;
use crate::mock_server::state::MockState;

fn binary(content_type: &'static str, bytes: Vec<u8>) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

/// GET /api/download/key/{key}
///
/// Counts the download.
pub async fn download_by_key(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(key): Path<String>,
) -> Response {
    let mut state = state.write().await;

    match state.beatmaps.get_mut(&key) {
        Some(beatmap) => {
            beatmap.stats.downloads += 1;
            binary("application/zip", Fixtures::archive_bytes(&beatmap.key, &beatmap.hash))
        }
        None => not_found(format!("No beatmap with key: {key}")),
    }
}

/// GET /cdn/{key}/{hash}.{zip|jpg}
///
/// Direct downloads are not counted.
pub async fn cdn_file(
    State(state): State<Arc<RwLock<MockState>>>,
    Path((key, file)): Path<(String, String)>,
) -> Response {
    let state = state.read().await;

    let Some(beatmap) = state.get_by_key(&key) else {
        return not_found(format!("No beatmap with key: {key}"));
    };

    match file.rsplit_once('.') {
        Some((hash, "zip")) if hash == beatmap.hash => {
            binary("application/zip", Fixtures::archive_bytes(&beatmap.key, &beatmap.hash))
        }
        Some((hash, "jpg")) if hash == beatmap.hash => {
            binary("image/jpeg", Fixtures::cover_bytes(&beatmap.hash))
        }
        _ => not_found(format!("No file {file} for beatmap {key}")),
    }
}
