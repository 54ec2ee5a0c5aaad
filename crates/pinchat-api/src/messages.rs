use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use pinchat_chat::Draft;
use pinchat_types::api::{Claims, SendMessageRequest};
use pinchat_types::models::MessageKind;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_session};

/// POST /chat/messages: sends into the session's current scope, threaded
/// under its pending reply target.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = draft_from_request(req)?;
    let message =
        with_session(&state, &claims, move |chat, session| chat.send(session, draft)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let message = with_session(&state, &claims, move |chat, session| {
        chat.message(session, message_id)
    })
    .await?;
    Ok(Json(message))
}

/// GET /messages/{id}/attachment: raw blob of an image/file/voice message.
pub async fn download_attachment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (attachment, bytes) = with_session(&state, &claims, move |chat, session| {
        chat.attachment(session, message_id)
    })
    .await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe(&attachment.file_name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

fn draft_from_request(req: SendMessageRequest) -> ApiResult<Draft> {
    let kind: MessageKind = req.kind.parse().map_err(ApiError::from)?;
    if kind.is_text() {
        return Ok(Draft::Text(req.content.unwrap_or_default()));
    }

    let data = req
        .data
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "no file was uploaded"))?;
    let bytes = B64
        .decode(data.as_bytes())
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "attachment is not valid base64"))?;
    Ok(Draft::Upload {
        kind,
        file_name: req.file_name.unwrap_or_else(|| kind.as_str().to_string()),
        bytes,
    })
}

/// Printable ASCII without quotes or backslashes.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
