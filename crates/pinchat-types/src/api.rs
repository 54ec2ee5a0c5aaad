use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AttachmentRef, MessageKind, Scope};

// -- JWT Claims --

/// Session token claims. `sid` names the server-side chat session the
/// token drives; one user may hold several sessions at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub sid: Uuid,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationStatus {
    pub username: String,
    pub registered: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub pin: String,
    pub pin_confirm: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub token: String,
}

// -- Session navigation --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetTargetRequest {
    /// `None` selects the global chat.
    pub peer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetSearchRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPageSizeRequest {
    pub page_size: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageTargetRequest {
    pub message_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveEditRequest {
    pub content: String,
}

// -- Messages --

/// `kind` stays a plain string so unknown kinds are reported as validation
/// errors rather than body deserialization failures.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Base64 (standard alphabet) attachment bytes.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub author: String,
    pub recipient: Option<String>,
    pub created_at: DateTime<Utc>,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub attachment: Option<AttachmentRef>,
    pub reply_to: Option<Uuid>,
    pub reply_preview: Option<ReplyPreview>,
    pub likes: LikeSummary,
    pub liked_by_me: bool,
}

// -- Reactions --

/// Display form of a message's likers: sorted, truncated, with a remainder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeSummary {
    pub count: usize,
    pub shown: Vec<String>,
    pub more: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub message_id: Uuid,
    pub liked: bool,
    pub likes: LikeSummary,
}

// -- Replies --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReplyPreview {
    Known {
        author: String,
        kind: MessageKind,
        excerpt: String,
    },
    /// The reply target was never created or no longer exists.
    Unknown,
}

// -- Chat view --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatView {
    pub username: String,
    pub scope: Scope,
    pub title: String,
    pub online_users: Vec<String>,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub search: Option<String>,
    /// Search was active and nothing matched.
    pub no_results: bool,
    pub messages: Vec<MessageResponse>,
    pub editable_message_id: Option<Uuid>,
    pub editing_message_id: Option<Uuid>,
    pub new_message: bool,
    pub pending_reply: Option<PendingReply>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReply {
    pub message_id: Uuid,
    pub preview: ReplyPreview,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineUsersResponse {
    pub users: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
