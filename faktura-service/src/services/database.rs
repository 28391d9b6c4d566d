//! Data store gateway for faktura-service.
//!
//! The reconciliation handlers talk to storage through the
//! [`DocumentStore`] trait; [`Database`] is the PostgreSQL
//! implementation. The store is the source of truth for a document's
//! status at decision time: both state-changing operations are
//! compare-and-set updates, so two concurrent deliveries for the same
//! document cannot both observe the reconcilable state.

use crate::models::{Document, DocumentStatus, LineItem, NewNotification, NewPayment};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use faktura_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Result of attempting the atomic payment unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Status moved to paid; payment record and notification written.
    Applied,
    /// Another delivery won the race (status compare-and-set missed,
    /// or the gateway event id was already recorded). Nothing written.
    AlreadyApplied,
}

/// Storage surface the reconciliation core depends on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id.
    async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, AppError>;

    /// Fetch a document's line items in display order.
    async fn get_line_items(&self, document_id: Uuid) -> Result<Vec<LineItem>, AppError>;

    /// Apply the payment unit atomically: conditional Unpaid -> Paid
    /// status update, payment record insert, notification insert.
    /// Either all three commit or none do.
    async fn mark_invoice_paid(
        &self,
        payment: NewPayment,
        notification: NewNotification,
    ) -> Result<PaymentOutcome, AppError>;

    /// Conditionally move a pending quote to a terminal status.
    /// Returns the updated document, or `None` when the quote was no
    /// longer pending (a concurrent writer got there first).
    async fn set_quote_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
    ) -> Result<Option<Document>, AppError>;
}

/// PostgreSQL connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

const DOCUMENT_COLUMNS: &str = "document_id, kind, document_number, user_id, counterparty, \
     status, discount, tax, created_utc, updated_utc";

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "faktura-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for Database {
    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_document"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {} FROM documents WHERE document_id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get document: {}", e)))?;

        timer.observe_duration();

        Ok(document)
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn get_line_items(&self, document_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_line_items"])
            .start_timer();

        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT line_item_id, document_id, description, quantity, unit, unit_price, sort_order
            FROM line_items
            WHERE document_id = $1
            ORDER BY sort_order, line_item_id
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e)))?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(
        skip(self, payment, notification),
        fields(document_id = %payment.document_id, gateway_event_id = %payment.gateway_event_id)
    )]
    async fn mark_invoice_paid(
        &self,
        payment: NewPayment,
        notification: NewNotification,
    ) -> Result<PaymentOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_invoice_paid"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        // Compare-and-set on status. Zero rows means another delivery
        // already reconciled this invoice.
        let updated = sqlx::query(
            r#"
            UPDATE documents
            SET status = 'paid', updated_utc = NOW()
            WHERE document_id = $1 AND kind = 'invoice' AND status = 'unpaid'
            "#,
        )
        .bind(payment.document_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update document status: {}", e))
        })?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.ok();
            timer.observe_duration();
            warn!(
                document_id = %payment.document_id,
                "Invoice left the reconcilable state before the payment unit committed"
            );
            return Ok(PaymentOutcome::AlreadyApplied);
        }

        let payment_id = Uuid::new_v4();
        let inserted = sqlx::query(
            r#"
            INSERT INTO payments
                (payment_id, document_id, user_id, amount, paid_utc, note, status_label, gateway_event_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payment_id)
        .bind(payment.document_id)
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(payment.paid_utc)
        .bind(&payment.note)
        .bind(&payment.status_label)
        .bind(&payment.gateway_event_id)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            tx.rollback().await.ok();
            timer.observe_duration();
            // The unique index on gateway_event_id is the second line
            // of defense against duplicate deliveries racing the
            // status check.
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    warn!(
                        gateway_event_id = %payment.gateway_event_id,
                        "Gateway event already recorded, skipping duplicate payment"
                    );
                    return Ok(PaymentOutcome::AlreadyApplied);
                }
            }
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Failed to insert payment record: {}",
                e
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO notifications (notification_id, user_id, message, link)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(&notification.message)
        .bind(&notification.link)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert notification: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit payment unit: {}", e))
        })?;

        timer.observe_duration();

        info!(
            document_id = %payment.document_id,
            payment_id = %payment_id,
            gateway_event_id = %payment.gateway_event_id,
            "Invoice marked paid with payment record and notification"
        );

        Ok(PaymentOutcome::Applied)
    }

    #[instrument(skip(self), fields(document_id = %document_id, status = status.as_str()))]
    async fn set_quote_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
    ) -> Result<Option<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_quote_status"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET status = $2, updated_utc = NOW()
            WHERE document_id = $1 AND kind = 'quote' AND status = 'pending'
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(document_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update quote status: {}", e))
        })?;

        timer.observe_duration();

        if let Some(ref doc) = document {
            info!(
                document_id = %doc.document_id,
                status = %doc.status,
                "Quote status updated"
            );
        }

        Ok(document)
    }
}
