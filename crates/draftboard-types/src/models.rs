use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named container whose history is a sequence of drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub latest_version: i64,
    pub created_at: DateTime<Utc>,
}

/// One versioned snapshot of a document's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: i64,
    pub document_id: i64,
    pub content: String,
    pub version_number: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub draft_id: i64,
    pub user_id: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: i64,
    pub comment_id: i64,
    pub user_id: i64,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

/// A comment folded together with every reaction attached to it.
/// `reactions` is always present in the JSON, empty when nobody reacted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithReactions {
    pub id: i64,
    pub draft_id: i64,
    pub user_id: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub reactions: Vec<Reaction>,
}

impl CommentWithReactions {
    pub fn new(comment: Comment) -> Self {
        Self {
            id: comment.id,
            draft_id: comment.draft_id,
            user_id: comment.user_id,
            text: comment.text,
            parent_comment_id: comment.parent_comment_id,
            created_at: comment.created_at,
            reactions: Vec::new(),
        }
    }
}
