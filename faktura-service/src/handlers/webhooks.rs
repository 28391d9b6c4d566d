//! Payment gateway webhook handler.
//!
//! Reconciles "payment completed" events against invoices:
//! authenticate, extract correlation fields, guard the Unpaid -> Paid
//! transition, then apply the status update, payment record, and
//! notification as one atomic unit.
//!
//! The gateway retries deliveries that do not return 2xx, so every
//! authenticated, well-formed event is acknowledged with 200 even when
//! reconciliation decides to do nothing. Only authentication failures,
//! malformed events, and persistence failures surface as errors; the
//! last of those leaves the invoice unpaid and the gateway's retry
//! re-drives reconciliation later.

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use faktura_core::error::AppError;

use crate::{
    dtos::WebhookAck,
    models::{guard, Decision, DocumentKind, DocumentStatus, NewNotification, NewPayment},
    services::gateway::{PaymentCorrelation, EVENT_PAYMENT_COMPLETED, SIGNATURE_HEADER},
    services::metrics::{PAYMENT_AMOUNT_TOTAL, WEBHOOK_EVENTS_TOTAL},
    services::totals,
    services::PaymentOutcome,
    AppState,
};

/// Payment gateway webhook endpoint.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>, AppError> {
    // An empty secret would let anyone pass verification by signing
    // with the empty key, so an unconfigured verifier rejects
    // everything.
    if !state.verifier.is_configured() {
        tracing::error!("Webhook secret not configured, rejecting delivery");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Webhook secret not configured"
        )));
    }

    // Extract signature from headers
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing {} header", SIGNATURE_HEADER);
            AppError::Unauthorized(anyhow::anyhow!("Missing webhook signature"))
        })?;

    // Verify signature over the raw body before anything else; no
    // write happens on an unauthenticated delivery.
    let is_valid = state.verifier.verify(&body, signature).map_err(|e| {
        tracing::error!(error = %e, "Webhook signature verification error");
        AppError::InternalError(anyhow::anyhow!("Webhook verification failed"))
    })?;

    if !is_valid {
        tracing::warn!("Invalid webhook signature");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid webhook signature"
        )));
    }

    // Parse the webhook event
    let event = state.verifier.parse_event(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse webhook event");
        AppError::BadRequest(anyhow::anyhow!("Invalid webhook payload"))
    })?;

    tracing::info!(
        event_id = %event.id,
        event_kind = %event.event,
        "Processing gateway webhook"
    );

    // The gateway delivers many event kinds to the same endpoint; only
    // completed payments are reconciled, the rest are acknowledged.
    if event.event != EVENT_PAYMENT_COMPLETED {
        tracing::debug!(event_kind = %event.event, "Unhandled webhook event kind");
        WEBHOOK_EVENTS_TOTAL
            .with_label_values(&[event.event.as_str(), "ignored"])
            .inc();
        return Ok(Json(WebhookAck { received: true }));
    }

    let correlation = event.payment_correlation()?;
    let outcome = reconcile_payment(&state, &correlation).await?;

    WEBHOOK_EVENTS_TOTAL
        .with_label_values(&[EVENT_PAYMENT_COMPLETED, outcome])
        .inc();

    Ok(Json(WebhookAck { received: true }))
}

/// Run one payment event end to end. Returns the outcome label used
/// for observability; all outcomes except persistence failure are
/// acknowledged to the caller.
async fn reconcile_payment(
    state: &AppState,
    correlation: &PaymentCorrelation,
) -> Result<&'static str, AppError> {
    let document = match state.store.get_document(correlation.document_id).await? {
        Some(document) => document,
        None => {
            // Retrying cannot repair an unknown id, so acknowledge and
            // leave a trace for investigation.
            tracing::warn!(
                document_id = %correlation.document_id,
                gateway_event_id = %correlation.event_id,
                "Payment event references an unknown document"
            );
            return Ok("unknown_document");
        }
    };

    let kind = DocumentKind::from_code(&document.kind).ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Document {} has unrecognized kind '{}'",
            document.document_id,
            document.kind
        ))
    })?;
    let current = DocumentStatus::from_code(&document.status).ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Document {} has unrecognized status '{}'",
            document.document_id,
            document.status
        ))
    })?;

    match guard(kind, current, DocumentStatus::Paid) {
        Decision::Reject(reason) => {
            // The document already left the reconcilable state; a
            // transition conflict here is not a delivery failure, and
            // failing the webhook would only cause pointless retries.
            tracing::warn!(
                document_id = %document.document_id,
                kind = %document.kind,
                status = %document.status,
                reason = ?reason,
                gateway_event_id = %correlation.event_id,
                "Payment event not applicable, acknowledging without writes"
            );
            Ok("rejected")
        }
        Decision::AlreadyApplied => {
            tracing::info!(
                document_id = %document.document_id,
                gateway_event_id = %correlation.event_id,
                "Invoice already paid, acknowledging duplicate delivery"
            );
            Ok("already_applied")
        }
        Decision::Apply => {
            let payment = NewPayment {
                document_id: correlation.document_id,
                user_id: correlation.user_id,
                amount: correlation.amount,
                paid_utc: correlation.paid_utc,
                note: format!("Reconciled from gateway event {}", correlation.event_id),
                status_label: DocumentStatus::Paid.as_str().to_string(),
                gateway_event_id: correlation.event_id.clone(),
            };
            let notification = NewNotification {
                user_id: correlation.user_id,
                message: format!(
                    "Payment of {} received for invoice {} from {}",
                    totals::format_idr(correlation.amount),
                    correlation.document_number,
                    correlation.counterparty
                ),
                link: format!(
                    "{}/documents/{}",
                    state.config.app.base_url, correlation.document_id
                ),
            };

            match state.store.mark_invoice_paid(payment, notification).await? {
                PaymentOutcome::Applied => {
                    PAYMENT_AMOUNT_TOTAL
                        .with_label_values(&["IDR"])
                        .inc_by(correlation.amount.max(0.0));
                    tracing::info!(
                        document_id = %correlation.document_id,
                        amount = correlation.amount,
                        gateway_event_id = %correlation.event_id,
                        "Payment reconciled"
                    );
                    Ok("applied")
                }
                PaymentOutcome::AlreadyApplied => Ok("already_applied"),
            }
        }
    }
}
