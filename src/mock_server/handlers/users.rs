//! User endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::RwLock;

use super::not_found;
use crate::mock_server::state::MockState;

/// GET /api/users/find/{id}
pub async fn find_user(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(id): Path<String>,
) -> Response {
    let state = state.read().await;

    match state.get_user(&id) {
        Some(user) => (StatusCode::OK, Json(user.clone())).into_response(),
        None => not_found(format!("No user found with id: {id}")),
    }
}
