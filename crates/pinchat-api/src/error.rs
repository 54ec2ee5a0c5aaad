use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use pinchat_types::ChatError;
use pinchat_types::api::ErrorResponse;
use tracing::{debug, error};

pub type ApiResult<T> = Result<T, ApiError>;

/// Status code plus a message the client can show to the user.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = match &err {
            ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ChatError::NotEditable(_) => StatusCode::FORBIDDEN,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::AlreadyRegistered(_) => StatusCode::CONFLICT,
            ChatError::Storage(e) => {
                error!("Storage failure: {:#}", e);
                return Self::internal();
            }
        };
        debug!("Request rejected ({}): {}", status, err);
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
