//! Vote endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::mock_server::state::{MockState, VoteRejection};
use crate::{RestError, VoteDirection};

/// Body of a Steam vote.
#[derive(Debug, Deserialize)]
pub struct VoteParams {
    #[serde(rename = "steamID")]
    pub steam_id: String,
    pub ticket: String,
    pub direction: String,
}

fn rejection(status: StatusCode, code: i32, identifier: &str) -> Response {
    (status, Json(RestError::new(code, identifier))).into_response()
}

/// POST /api/vote/steam/{key}
pub async fn vote_steam(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(key): Path<String>,
    Json(params): Json<VoteParams>,
) -> Response {
    let direction = match params.direction.as_str() {
        "1" => VoteDirection::Up,
        "-1" => VoteDirection::Down,
        _ => return rejection(StatusCode::BAD_REQUEST, 0x01, "ERR_INVALID_DIRECTION"),
    };

    let mut state = state.write().await;

    match state.vote(&key, &params.steam_id, &params.ticket, direction) {
        Ok(beatmap) => (StatusCode::OK, Json(beatmap.clone())).into_response(),
        Err(reason) => {
            let (status, code) = match reason {
                VoteRejection::UnknownBeatmap => (StatusCode::NOT_FOUND, 0x404),
                VoteRejection::InvalidSteamId => (StatusCode::BAD_REQUEST, 0x02),
                VoteRejection::InvalidTicket => (StatusCode::BAD_REQUEST, 0x03),
                VoteRejection::BadTicket => (StatusCode::UNAUTHORIZED, 0x04),
            };
            rejection(status, code, reason.identifier())
        }
    }
}
