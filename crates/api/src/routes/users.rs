//! User management routes.
//!
//! Both routes act on behalf of the user named by `X-User-Id` and refuse to
//! touch protected users.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
};

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::ActingUser;

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/deactivate", post(deactivate_user))
}

/// DELETE `/users/{id}` - Delete a user.
async fn delete_user(
    State(state): State<AppState>,
    ActingUser(actor_id): ActingUser,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.users.delete(id, actor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/users/{id}/deactivate` - Deactivate a user.
async fn deactivate_user(
    State(state): State<AppState>,
    ActingUser(actor_id): ActingUser,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.deactivate(id, actor_id).await?;
    Ok(Json(user))
}
