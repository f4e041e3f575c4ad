use serde::{Deserialize, Serialize};

// -- Drafts --

#[derive(Debug, Deserialize)]
pub struct CreateDraftRequest {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// Query parameters are taken as raw strings so that a missing, empty or
/// malformed value can each be reported with its own message.
#[derive(Debug, Deserialize)]
pub struct DraftListQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DraftSearchQuery {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    pub draft_id: Option<String>,
}

// -- Comments --

/// Body of `POST /api/comments`. Any `id` or `createdAt` sent by the client
/// is ignored; both are assigned by the store.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub draft_id: i64,
    pub user_id: i64,
    pub text: String,
    #[serde(default)]
    pub parent_comment_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddCommentResponse {
    pub id: i64,
    pub message: String,
}

// -- Reactions --

/// Body of `POST /api/comment/{commentId}/reaction`. The comment is taken
/// from the path; an `id` in the body is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReactionRequest {
    pub user_id: i64,
    pub emoji: String,
}

// -- Shared --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
