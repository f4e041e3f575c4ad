use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::state::AppState;
use crate::{comments, documents, drafts, reactions};

/// All HTTP routes, bound to `state`. Unknown paths fall through to 404.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/drafts", post(drafts::create_draft).get(drafts::list_drafts))
        .route("/api/drafts/search", get(drafts::search_drafts))
        .route("/api/drafts/comments-reactions", get(drafts::comments_and_reactions))
        .route("/api/drafts/{draftId}", get(drafts::get_draft))
        .route("/api/documents/latest", get(documents::latest_versions))
        .route("/api/documents/{documentId}", get(documents::get_document))
        .route("/api/comments", post(comments::add_comment))
        .route("/api/comment/{commentId}/reaction", post(reactions::add_reaction))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
