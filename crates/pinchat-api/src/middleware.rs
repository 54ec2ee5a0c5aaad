use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use pinchat_types::api::Claims;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Extract and validate the JWT from the Authorization header and make
/// its claims available to handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(ApiError::unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(ApiError::unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::unauthorized())?;

    // Logged-out or pre-restart sessions are gone from the registry.
    if state.sessions.get(token_data.claims.sid)?.is_none() {
        return Err(ApiError::unauthorized());
    }

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
