//! Session view and navigation: everything that changes what the client
//! is looking at rather than what is stored.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use pinchat_types::api::{
    Claims, MessageTargetRequest, OnlineUsersResponse, SaveEditRequest, SetPageSizeRequest,
    SetSearchRequest, SetTargetRequest,
};

use crate::error::ApiResult;
use crate::state::{AppState, with_session};

/// GET /chat: the polling endpoint. Clients call it on a timer.
pub async fn view(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let view = with_session(&state, &claims, |chat, session| chat.refresh(session)).await?;
    Ok(Json(view))
}

pub async fn set_target(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetTargetRequest>,
) -> ApiResult<impl IntoResponse> {
    with_session(&state, &claims, move |chat, session| {
        chat.select_peer(session, req.peer.as_deref())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_search(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetSearchRequest>,
) -> ApiResult<impl IntoResponse> {
    with_session(&state, &claims, move |chat, session| {
        chat.set_search(session, &req.text)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_page_size(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetPageSizeRequest>,
) -> ApiResult<impl IntoResponse> {
    with_session(&state, &claims, move |chat, session| {
        chat.set_page_size(session, req.page_size)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn next_page(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    with_session(&state, &claims, |chat, session| chat.next_page(session)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn previous_page(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    with_session(&state, &claims, |chat, session| chat.previous_page(session)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Reply target --

pub async fn set_reply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MessageTargetRequest>,
) -> ApiResult<impl IntoResponse> {
    with_session(&state, &claims, move |chat, session| {
        chat.set_reply_target(session, req.message_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_reply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    with_session(&state, &claims, |chat, session| chat.clear_reply_target(session)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Edit --

pub async fn begin_edit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MessageTargetRequest>,
) -> ApiResult<impl IntoResponse> {
    with_session(&state, &claims, move |chat, session| {
        chat.begin_edit(session, req.message_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn save_edit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SaveEditRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = with_session(&state, &claims, move |chat, session| {
        chat.save_edit(session, &req.content)
    })
    .await?;
    Ok(Json(message))
}

pub async fn cancel_edit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    with_session(&state, &claims, |chat, session| chat.cancel_edit(session)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Presence --

pub async fn online_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let users = with_session(&state, &claims, |chat, _session| chat.online_users()).await?;
    Ok(Json(OnlineUsersResponse { users }))
}
