pub mod auth;
pub mod chat;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod reactions;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
};

use crate::middleware::require_auth;
use crate::state::AppState;

/// All routes, without transport layers (CORS, tracing), which the binary
/// adds.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/status/{username}", get(auth::status))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/chat", get(chat::view))
        .route("/chat/target", put(chat::set_target))
        .route("/chat/search", put(chat::set_search))
        .route("/chat/page-size", put(chat::set_page_size))
        .route("/chat/page/next", post(chat::next_page))
        .route("/chat/page/previous", post(chat::previous_page))
        .route("/chat/messages", post(messages::send_message))
        .route("/chat/reply", put(chat::set_reply).delete(chat::clear_reply))
        .route(
            "/chat/edit",
            post(chat::begin_edit)
                .put(chat::save_edit)
                .delete(chat::cancel_edit),
        )
        .route("/users/online", get(chat::online_users))
        .route("/messages/{message_id}", get(messages::get_message))
        .route(
            "/messages/{message_id}/like",
            put(reactions::like)
                .delete(reactions::unlike)
                .post(reactions::toggle),
        )
        .route(
            "/messages/{message_id}/attachment",
            get(messages::download_attachment),
        )
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    let limit = body_limit(state.chat.settings().max_attachment_bytes);
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Uploads arrive base64-encoded inside JSON, so the body may be a third
/// larger than the attachment itself.
fn body_limit(max_attachment_bytes: usize) -> usize {
    max_attachment_bytes
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(64 * 1024)
}

async fn health() -> &'static str {
    "ok"
}
