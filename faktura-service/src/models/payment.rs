//! Payment record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Durable record of a reconciled gateway payment. Exactly one exists
/// per accepted payment event; `gateway_event_id` carries a unique
/// constraint so duplicate deliveries can never double-insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentRecord {
    pub payment_id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub paid_utc: DateTime<Utc>,
    pub note: String,
    pub status_label: String,
    pub gateway_event_id: String,
    pub created_utc: DateTime<Utc>,
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub paid_utc: DateTime<Utc>,
    pub note: String,
    pub status_label: String,
    pub gateway_event_id: String,
}
