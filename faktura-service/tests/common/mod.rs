//! Shared test harness: the production router wired to an in-memory
//! document store.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use chrono::Utc;
use faktura_core::error::AppError;
use faktura_core::utils::signature::sign_body;
use faktura_service::{
    app_router,
    config::{AppConfig, Config, DatabaseConfig, ServerConfig, WebhookConfig},
    models::{Document, DocumentStatus, LineItem, NewNotification, NewPayment, Notification,
        PaymentRecord},
    services::{DocumentStore, PaymentOutcome, WebhookVerifier},
    AppState,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "test_webhook_secret";
pub const APP_BASE_URL: &str = "http://app.test";

/// In-memory [`DocumentStore`] with the same conditional-write
/// semantics as the PostgreSQL implementation.
#[derive(Default)]
pub struct InMemoryStore {
    pub documents: Mutex<HashMap<Uuid, Document>>,
    pub line_items: Mutex<HashMap<Uuid, Vec<LineItem>>>,
    pub payments: Mutex<Vec<PaymentRecord>>,
    pub notifications: Mutex<Vec<Notification>>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    /// Make every state-changing operation fail, simulating an
    /// unavailable store.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn insert_document(&self, document: Document, items: Vec<LineItem>) {
        self.line_items
            .lock()
            .unwrap()
            .insert(document.document_id, items);
        self.documents
            .lock()
            .unwrap()
            .insert(document.document_id, document);
    }

    pub fn document_status(&self, document_id: Uuid) -> String {
        self.documents.lock().unwrap()[&document_id].status.clone()
    }

    pub fn payment_count(&self) -> usize {
        self.payments.lock().unwrap().len()
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self.documents.lock().unwrap().get(&document_id).cloned())
    }

    async fn get_line_items(&self, document_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        Ok(self
            .line_items
            .lock()
            .unwrap()
            .get(&document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_invoice_paid(
        &self,
        payment: NewPayment,
        notification: NewNotification,
    ) -> Result<PaymentOutcome, AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "store unavailable"
            )));
        }

        let mut documents = self.documents.lock().unwrap();
        let mut payments = self.payments.lock().unwrap();

        let document = match documents.get_mut(&payment.document_id) {
            Some(document) if document.kind == "invoice" && document.status == "unpaid" => document,
            _ => return Ok(PaymentOutcome::AlreadyApplied),
        };

        // Unique constraint on the gateway event id.
        if payments
            .iter()
            .any(|p| p.gateway_event_id == payment.gateway_event_id)
        {
            return Ok(PaymentOutcome::AlreadyApplied);
        }

        document.status = "paid".to_string();
        document.updated_utc = Utc::now();

        payments.push(PaymentRecord {
            payment_id: Uuid::new_v4(),
            document_id: payment.document_id,
            user_id: payment.user_id,
            amount: payment.amount,
            paid_utc: payment.paid_utc,
            note: payment.note,
            status_label: payment.status_label,
            gateway_event_id: payment.gateway_event_id,
            created_utc: Utc::now(),
        });

        self.notifications.lock().unwrap().push(Notification {
            notification_id: Uuid::new_v4(),
            user_id: notification.user_id,
            message: notification.message,
            link: notification.link,
            created_utc: Utc::now(),
        });

        Ok(PaymentOutcome::Applied)
    }

    async fn set_quote_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
    ) -> Result<Option<Document>, AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "store unavailable"
            )));
        }

        let mut documents = self.documents.lock().unwrap();
        match documents.get_mut(&document_id) {
            Some(document) if document.kind == "quote" && document.status == "pending" => {
                document.status = status.as_str().to_string();
                document.updated_utc = Utc::now();
                Ok(Some(document.clone()))
            }
            _ => Ok(None),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with_secret(WEBHOOK_SECRET)
}

/// Spawn the app with an explicit webhook secret (empty string means
/// unconfigured).
pub fn spawn_app_with_secret(webhook_secret: &str) -> TestApp {
    let store = Arc::new(InMemoryStore::default());

    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: Secret::new("postgres://unused".to_string()),
            max_connections: 1,
            min_connections: 1,
        },
        webhook: WebhookConfig {
            secret: Secret::new(webhook_secret.to_string()),
        },
        app: AppConfig {
            base_url: APP_BASE_URL.to_string(),
        },
        service_name: "faktura-service".to_string(),
    };

    let state = AppState {
        config,
        store: store.clone(),
        verifier: WebhookVerifier::new(Secret::new(webhook_secret.to_string())),
    };

    TestApp {
        router: app_router(state),
        store,
    }
}

fn line_item(document_id: Uuid, description: &str, quantity: f64, unit_price: f64, order: i32) -> LineItem {
    LineItem {
        line_item_id: Uuid::new_v4(),
        document_id,
        description: description.to_string(),
        quantity: Some(quantity),
        unit: Some("pcs".to_string()),
        unit_price: Some(unit_price),
        sort_order: order,
    }
}

fn document(kind: &str, number: &str, status: &str) -> Document {
    Document {
        document_id: Uuid::new_v4(),
        kind: kind.to_string(),
        document_number: number.to_string(),
        user_id: Uuid::new_v4(),
        counterparty: "PT Maju Jaya".to_string(),
        status: status.to_string(),
        discount: Some(10000.0),
        tax: Some(5000.0),
        created_utc: Utc::now(),
        updated_utc: Utc::now(),
    }
}

/// Seed an invoice with items 2 x 50000 + 1 x 25000, discount 10000,
/// tax 5000 (subtotal 125000, total 120000).
pub fn seed_invoice(app: &TestApp, status: &str) -> Document {
    let doc = document("invoice", "INV-2025-001", status);
    let items = vec![
        line_item(doc.document_id, "Design work", 2.0, 50000.0, 0),
        line_item(doc.document_id, "Hosting", 1.0, 25000.0, 1),
    ];
    app.store.insert_document(doc.clone(), items);
    doc
}

pub fn seed_quote(app: &TestApp, status: &str) -> Document {
    let doc = document("quote", "QUO-2025-014", status);
    let items = vec![line_item(doc.document_id, "Consulting", 3.0, 40000.0, 0)];
    app.store.insert_document(doc.clone(), items);
    doc
}

/// Build the gateway's JSON body for a completed payment event.
pub fn payment_event_body(event_id: &str, document: &Document, amount: f64) -> String {
    json!({
        "id": event_id,
        "event": "payment.completed",
        "created_at": 1735689600,
        "data": {
            "document_id": document.document_id,
            "user_id": document.user_id,
            "document_number": document.document_number,
            "counterparty": document.counterparty,
            "amount": amount,
        }
    })
    .to_string()
}

pub fn sign(body: &str) -> String {
    sign_body(WEBHOOK_SECRET, body).unwrap()
}

pub async fn post_webhook(app: &TestApp, body: String, signature: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/payment")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("X-Webhook-Signature", signature);
    }

    app.router
        .clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn post_quote_status(app: &TestApp, quote_id: Uuid, status: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/quotes/{}/status", quote_id))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": status }).to_string()))
        .unwrap();

    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get_document(app: &TestApp, document_id: Uuid) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(format!("/documents/{}", document_id))
        .body(Body::empty())
        .unwrap();

    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
