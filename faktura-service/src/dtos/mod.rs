//! Request and response DTOs for faktura-service.

use crate::models::{Document, LineItem};
use crate::services::totals;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Acknowledgment body for webhook deliveries.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Request body for the quote status endpoint. The status arrives as a
/// raw label and is mapped into the closed enum at the boundary.
#[derive(Debug, Deserialize)]
pub struct QuoteStatusRequest {
    pub status: String,
}

/// Line item with its computed total.
#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub description: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub unit_price: f64,
    pub item_total: f64,
}

impl From<LineItem> for LineItemResponse {
    fn from(item: LineItem) -> Self {
        let quantity = item.quantity.unwrap_or(0.0);
        let unit_price = item.unit_price.unwrap_or(0.0);
        Self {
            description: item.description,
            quantity,
            unit: item.unit,
            unit_price,
            item_total: totals::item_total(quantity, unit_price),
        }
    }
}

/// Document representation with derived financial totals.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document_id: Uuid,
    pub kind: String,
    pub document_number: String,
    pub user_id: Uuid,
    pub counterparty: String,
    pub status: String,
    pub items: Vec<LineItemResponse>,
    pub discount: f64,
    pub tax: f64,
    pub subtotal: f64,
    pub total: f64,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl DocumentResponse {
    pub fn from_parts(document: Document, items: Vec<LineItem>) -> Self {
        let discount = totals::to_number(document.discount.unwrap_or(0.0));
        let tax = totals::to_number(document.tax.unwrap_or(0.0));
        let subtotal = totals::subtotal(&items);
        let total = totals::total(subtotal, discount, tax);

        Self {
            document_id: document.document_id,
            kind: document.kind,
            document_number: document.document_number,
            user_id: document.user_id,
            counterparty: document.counterparty,
            status: document.status,
            items: items.into_iter().map(LineItemResponse::from).collect(),
            discount,
            tax,
            subtotal,
            total,
            created_utc: document.created_utc,
            updated_utc: document.updated_utc,
        }
    }
}
