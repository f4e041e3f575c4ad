use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use tracing::info;

use draftboard_types::api::{AddCommentRequest, AddCommentResponse};

use crate::ApiError;
use crate::state::{AppState, with_db};

/// POST /api/comments: attach a comment (optionally a reply) to a draft.
pub async fn add_comment(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<AddCommentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if req.text.is_empty() {
        return Err(ApiError::BadRequest("text is required".into()));
    }

    let draft_id = req.draft_id;
    let id = with_db(&state, move |db| {
        db.add_comment(req.draft_id, req.user_id, &req.text, req.parent_comment_id)
    })
    .await?;
    info!("Comment {} added to draft {}", id, draft_id);

    Ok((
        StatusCode::CREATED,
        Json(AddCommentResponse {
            id,
            message: "Comment added successfully".into(),
        }),
    ))
}
