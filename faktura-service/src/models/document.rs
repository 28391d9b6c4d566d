//! Document model: an invoice or a quote, same shape, distinguished by kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Quote,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Quote => "quote",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "invoice" => Some(DocumentKind::Invoice),
            "quote" => Some(DocumentKind::Quote),
            _ => None,
        }
    }
}

/// Document status.
///
/// Invoices only ever use `Unpaid`/`Paid`; quotes only ever use
/// `Pending`/`Accepted`/`Rejected`. The transition guard enforces the
/// split; free-text status strings are mapped here at the boundary and
/// never reach transition logic raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Unpaid,
    Paid,
    Pending,
    Accepted,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Unpaid => "unpaid",
            DocumentStatus::Paid => "paid",
            DocumentStatus::Pending => "pending",
            DocumentStatus::Accepted => "accepted",
            DocumentStatus::Rejected => "rejected",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(DocumentStatus::Unpaid),
            "paid" => Some(DocumentStatus::Paid),
            "pending" => Some(DocumentStatus::Pending),
            "accepted" => Some(DocumentStatus::Accepted),
            "rejected" => Some(DocumentStatus::Rejected),
            _ => None,
        }
    }
}

/// Financial document (invoice or quote).
///
/// Status is the only field the reconciliation core ever writes; line
/// items, discount and tax are read-only inputs to totals computation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub document_id: Uuid,
    pub kind: String,
    pub document_number: String,
    pub user_id: Uuid,
    pub counterparty: String,
    pub status: String,
    pub discount: Option<f64>,
    pub tax: Option<f64>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Line item on a document. No identity beyond its sort order within
/// the owning document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    pub line_item_id: Uuid,
    pub document_id: Uuid,
    pub description: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
    pub sort_order: i32,
}
