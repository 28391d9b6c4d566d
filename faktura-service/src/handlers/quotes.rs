//! Quote status endpoint.
//!
//! Unlike the payment path this is a synchronous user action, so a
//! transition conflict is surfaced as a 409 instead of being
//! swallowed.

use axum::{
    extract::{Path, State},
    Json,
};
use faktura_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{DocumentResponse, QuoteStatusRequest},
    models::{guard, Decision, DocumentKind, DocumentStatus, RejectReason},
    services::metrics::QUOTE_TRANSITIONS_TOTAL,
    AppState,
};

/// Move a pending quote to an accepted/rejected terminal status and
/// return the updated document with computed totals.
pub async fn update_quote_status(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
    Json(payload): Json<QuoteStatusRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    // Map the raw label into the closed enum before it can reach any
    // transition logic.
    let requested = DocumentStatus::from_code(&payload.status).ok_or_else(|| {
        QUOTE_TRANSITIONS_TOTAL
            .with_label_values(&["unknown", "invalid_status"])
            .inc();
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid quote status '{}'",
            payload.status
        ))
    })?;

    // Only the two terminal values are requestable targets.
    if !matches!(
        requested,
        DocumentStatus::Accepted | DocumentStatus::Rejected
    ) {
        QUOTE_TRANSITIONS_TOTAL
            .with_label_values(&[requested.as_str(), "invalid_status"])
            .inc();
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid quote status '{}'",
            payload.status
        )));
    }

    let document = state
        .store
        .get_document(quote_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quote not found")))?;

    let kind = DocumentKind::from_code(&document.kind).ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Document {} has unrecognized kind '{}'",
            document.document_id,
            document.kind
        ))
    })?;
    if kind != DocumentKind::Quote {
        return Err(AppError::NotFound(anyhow::anyhow!("Quote not found")));
    }

    let current = DocumentStatus::from_code(&document.status).ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Document {} has unrecognized status '{}'",
            document.document_id,
            document.status
        ))
    })?;

    let updated = match guard(kind, current, requested) {
        Decision::Reject(RejectReason::InvalidTarget) => {
            QUOTE_TRANSITIONS_TOTAL
                .with_label_values(&[requested.as_str(), "invalid_status"])
                .inc();
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Status '{}' is not valid for a quote",
                requested.as_str()
            )));
        }
        // Quotes have no idempotent re-apply: the guard only emits
        // AlreadyApplied for invoices, and a repeat of a terminal
        // state is a rejection per the transition table. Treat both
        // as a conflict so a guard change cannot silently reopen a
        // resolved quote.
        Decision::AlreadyApplied | Decision::Reject(RejectReason::NotTransitionable) => {
            QUOTE_TRANSITIONS_TOTAL
                .with_label_values(&[requested.as_str(), "conflict"])
                .inc();
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Quote is {} and cannot become {}",
                document.status,
                requested.as_str()
            )));
        }
        Decision::Apply => state
            .store
            .set_quote_status(quote_id, requested)
            .await?
            .ok_or_else(|| {
                // Compare-and-set miss: a concurrent request resolved
                // the quote between our read and the write.
                QUOTE_TRANSITIONS_TOTAL
                    .with_label_values(&[requested.as_str(), "conflict"])
                    .inc();
                AppError::Conflict(anyhow::anyhow!("Quote is no longer pending"))
            })?,
    };

    QUOTE_TRANSITIONS_TOTAL
        .with_label_values(&[requested.as_str(), "applied"])
        .inc();

    tracing::info!(
        quote_id = %quote_id,
        status = %updated.status,
        "Quote transition applied"
    );

    let items = state.store.get_line_items(quote_id).await?;

    Ok(Json(DocumentResponse::from_parts(updated, items)))
}
