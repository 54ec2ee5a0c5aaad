use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use pinchat_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegistrationStatus};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, blocking};

const TOKEN_LIFETIME_DAYS: i64 = 30;

/// GET /auth/status/{username}: tells the client whether to ask for a new
/// PIN or for the existing one.
pub async fn status(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let name = username.clone();
    let registered = blocking(&state, move |chat| chat.is_registered(&name)).await?;
    Ok(Json(RegistrationStatus {
        username: username.trim().to_string(),
        registered,
    }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    blocking(&state, move |chat| {
        chat.register(&req.username, &req.pin, &req.pin_confirm)
    })
    .await?;
    Ok(StatusCode::CREATED)
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = blocking(&state, move |chat| chat.login(&req.username, &req.pin)).await?;
    let username = session.username().to_string();

    // The session is only registered once its token exists.
    let sid = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::days(TOKEN_LIFETIME_DAYS);
    let token = create_token(&state.jwt_secret, &username, sid, expires_at).map_err(|e| {
        error!("Token signing failed: {}", e);
        ApiError::internal()
    })?;
    state.sessions.insert(sid, session, expires_at)?;

    Ok(Json(LoginResponse { username, token }))
}

/// POST /auth/logout: drops the server-side session behind the token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    if state.sessions.remove(claims.sid)? {
        info!("{} logged out", claims.sub);
    }
    Ok(StatusCode::NO_CONTENT)
}

fn create_token(
    secret: &str,
    username: &str,
    sid: Uuid,
    expires_at: DateTime<Utc>,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: username.to_string(),
        sid,
        exp: usize::try_from(expires_at.timestamp())?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
