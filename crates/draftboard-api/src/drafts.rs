use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use draftboard_types::api::{
    CommentsQuery, CreateDraftRequest, DraftListQuery, DraftSearchQuery, MessageResponse,
};

use crate::ApiError;
use crate::state::{AppState, with_db};

const DEFAULT_LIMIT: i64 = 1;

/// POST /api/drafts: store a draft, versioning the document if the name is known.
pub async fn create_draft(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateDraftRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }

    let draft = with_db(&state, move |db| db.create_draft(&req.name, &req.content)).await?;
    info!(
        "Draft {} added as version {} of document {}",
        draft.id, draft.version_number, draft.document_id
    );

    Ok((StatusCode::OK, Json(MessageResponse::new("Draft added successfully"))))
}

/// GET /api/drafts?limit=N: newest N drafts per document (default 1, 0 = all).
pub async fn list_drafts(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<DraftListQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = match query.limit.as_deref() {
        None | Some("") => DEFAULT_LIMIT,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ApiError::BadRequest("Invalid limit parameter".into()))?,
    };

    let drafts = with_db(&state, move |db| db.get_latest_drafts(limit)).await?;
    Ok(Json(drafts))
}

/// GET /api/drafts/search?text=Q
pub async fn search_drafts(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<DraftSearchQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let text = query
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("text parameter is required".into()))?;

    let drafts = with_db(&state, move |db| db.search_drafts(&text)).await?;
    Ok(Json(drafts))
}

/// GET /api/drafts/{draftId}
pub async fn get_draft(
    State(state): State<AppState>,
    WithRejection(Path(draft_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = with_db(&state, move |db| db.get_draft_by_id(draft_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("draft {draft_id} not found")))?;
    Ok(Json(draft))
}

/// GET /api/drafts/comments-reactions?draftId=N
pub async fn comments_and_reactions(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<CommentsQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let raw = query
        .draft_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("draftId query parameter is required".into()))?;
    let draft_id: i64 = raw
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid draftId".into()))?;

    let comments = with_db(&state, move |db| db.get_comments_and_reactions(draft_id)).await?;
    Ok(Json(comments))
}
