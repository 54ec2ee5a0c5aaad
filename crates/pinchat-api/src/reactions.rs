use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use pinchat_types::api::{Claims, LikeResponse};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::{AppState, with_session};

/// PUT /messages/{id}/like
pub async fn like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let likes = with_session(&state, &claims, move |chat, session| {
        chat.like(session, message_id)
    })
    .await?;
    Ok(Json(LikeResponse {
        message_id,
        liked: true,
        likes,
    }))
}

/// DELETE /messages/{id}/like
pub async fn unlike(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let likes = with_session(&state, &claims, move |chat, session| {
        chat.unlike(session, message_id)
    })
    .await?;
    Ok(Json(LikeResponse {
        message_id,
        liked: false,
        likes,
    }))
}

/// POST /messages/{id}/like: flips the caller's like.
pub async fn toggle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (liked, likes) = with_session(&state, &claims, move |chat, session| {
        chat.toggle_like(session, message_id)
    })
    .await?;
    Ok(Json(LikeResponse {
        message_id,
        liked,
        likes,
    }))
}
