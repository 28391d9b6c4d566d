//! Payment gateway webhook authentication and event parsing.
//!
//! The gateway signs each delivery with `HMAC-SHA256(body, secret)`
//! (hex-encoded) in the `X-Webhook-Signature` header. Verification is
//! pure: no writes happen until a delivery is both authenticated and
//! parsed into a typed event.

use anyhow::Result;
use chrono::{DateTime, Utc};
use faktura_core::error::AppError;
use faktura_core::utils::signature::verify_body;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use uuid::Uuid;

/// Header carrying the gateway's signature token.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// The one event kind this service reconciles. All other kinds are
/// acknowledged and ignored.
pub const EVENT_PAYMENT_COMPLETED: &str = "payment.completed";

/// Verifies inbound webhook deliveries against the pre-shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Secret<String>,
}

/// A parsed gateway event.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    /// The gateway's unique event id, used as the de-duplication key.
    pub id: String,
    /// Event kind, e.g. "payment.completed".
    pub event: String,
    /// Gateway-side unix timestamp of the event.
    pub created_at: i64,
    /// Correlation payload; shape depends on the event kind.
    #[serde(default)]
    pub data: EventData,
}

/// Correlation payload. Fields are optional at the wire level; the
/// required set per event kind is enforced by the extraction step.
#[derive(Debug, Default, Deserialize)]
pub struct EventData {
    pub document_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub document_number: Option<String>,
    pub counterparty: Option<String>,
    pub amount: Option<f64>,
}

/// Fully-extracted correlation block for a completed payment.
#[derive(Debug, Clone)]
pub struct PaymentCorrelation {
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub document_number: String,
    pub counterparty: String,
    pub amount: f64,
    pub event_id: String,
    pub paid_utc: DateTime<Utc>,
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// Check whether a webhook secret is configured at all.
    pub fn is_configured(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }

    /// Verify a delivery's signature against the raw body, in constant
    /// time.
    pub fn verify(&self, body: &str, signature: &str) -> Result<bool> {
        verify_body(self.secret.expose_secret(), body, signature)
    }

    /// Parse a verified body into a typed event.
    pub fn parse_event(&self, body: &str) -> Result<WebhookEvent> {
        let event: WebhookEvent = serde_json::from_str(body)?;
        Ok(event)
    }
}

impl WebhookEvent {
    /// Extract the correlation fields a completed payment must carry.
    /// A well-signed event missing any of them is malformed.
    pub fn payment_correlation(&self) -> Result<PaymentCorrelation, AppError> {
        let document_id = self
            .data
            .document_id
            .ok_or_else(|| malformed("document_id"))?;
        let user_id = self.data.user_id.ok_or_else(|| malformed("user_id"))?;
        let document_number = self
            .data
            .document_number
            .clone()
            .ok_or_else(|| malformed("document_number"))?;
        let counterparty = self
            .data
            .counterparty
            .clone()
            .ok_or_else(|| malformed("counterparty"))?;
        let amount = self.data.amount.ok_or_else(|| malformed("amount"))?;

        let paid_utc = DateTime::from_timestamp(self.created_at, 0).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Event timestamp {} is out of range",
                self.created_at
            ))
        })?;

        Ok(PaymentCorrelation {
            document_id,
            user_id,
            document_number,
            counterparty,
            amount,
            event_id: self.id.clone(),
            paid_utc,
        })
    }
}

fn malformed(field: &str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!("Event is missing required field '{}'", field))
}
