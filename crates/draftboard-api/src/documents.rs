use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use crate::ApiError;
use crate::state::{AppState, with_db};

/// GET /api/documents/latest: every document with its latest version number.
pub async fn latest_versions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let documents = with_db(&state, |db| db.get_all_documents_latest_versions()).await?;
    Ok(Json(documents))
}

/// GET /api/documents/{documentId}
pub async fn get_document(
    State(state): State<AppState>,
    WithRejection(Path(document_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let document = with_db(&state, move |db| db.get_document_by_id(document_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("document {document_id} not found")))?;
    Ok(Json(document))
}
