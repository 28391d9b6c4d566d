//! Services module for faktura-service.

pub mod database;
pub mod gateway;
pub mod metrics;
pub mod totals;

pub use database::{Database, DocumentStore, PaymentOutcome};
pub use gateway::WebhookVerifier;
pub use metrics::{get_metrics, init_metrics};
