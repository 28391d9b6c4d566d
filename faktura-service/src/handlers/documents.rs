//! Document read endpoint: the financial-presentation surface. Totals
//! in the response come from the same calculator the reconciliation
//! paths use, so rendered amounts and recorded amounts always agree.

use axum::{
    extract::{Path, State},
    Json,
};
use faktura_core::error::AppError;
use uuid::Uuid;

use crate::{dtos::DocumentResponse, AppState};

/// Get a document by id, with computed totals.
pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = state
        .store
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;

    let items = state.store.get_line_items(document_id).await?;

    Ok(Json(DocumentResponse::from_parts(document, items)))
}
