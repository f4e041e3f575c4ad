use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use draftboard_types::api::{AddReactionRequest, MessageResponse};
use draftboard_types::emoji::is_permitted_emoji_string;

use crate::ApiError;
use crate::state::{AppState, with_db};

/// POST /api/comment/{commentId}/reaction
///
/// The comment comes from the path. An empty emoji is rejected along with
/// anything outside the permitted blocks.
pub async fn add_reaction(
    State(state): State<AppState>,
    WithRejection(Path(comment_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<AddReactionRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if req.emoji.is_empty() || !is_permitted_emoji_string(&req.emoji) {
        warn!("Rejected emoji {:?} on comment {}", req.emoji, comment_id);
        return Err(ApiError::BadRequest("Invalid emoji".into()));
    }

    let id = with_db(&state, move |db| db.add_reaction(comment_id, req.user_id, &req.emoji)).await?;
    info!("Reaction {} added to comment {}", id, comment_id);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Reaction added successfully")),
    ))
}
