//! Domain models for faktura-service.

mod document;
mod notification;
mod payment;
mod transition;

pub use document::{Document, DocumentKind, DocumentStatus, LineItem};
pub use notification::{NewNotification, Notification};
pub use payment::{NewPayment, PaymentRecord};
pub use transition::{guard, Decision, RejectReason};
