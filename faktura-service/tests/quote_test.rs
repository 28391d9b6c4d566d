//! Quote status transition tests.

mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn test_pending_quote_can_be_accepted() {
    let app = spawn_app();
    let quote = seed_quote(&app, "pending");

    let response = post_quote_status(&app, quote.document_id, "accepted").await;

    assert_status(&response, StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["document_number"], "QUO-2025-014");
    // 3 x 40000 with the seeded discount/tax applied.
    assert_eq!(body["subtotal"], 120000.0);
    assert_eq!(body["total"], 115000.0);

    assert_eq!(app.store.document_status(quote.document_id), "accepted");
}

#[tokio::test]
async fn test_pending_quote_can_be_rejected() {
    let app = spawn_app();
    let quote = seed_quote(&app, "pending");

    let response = post_quote_status(&app, quote.document_id, "rejected").await;

    assert_status(&response, StatusCode::OK);
    assert_eq!(app.store.document_status(quote.document_id), "rejected");
}

#[tokio::test]
async fn test_rejected_quote_cannot_become_accepted() {
    let app = spawn_app();
    let quote = seed_quote(&app, "pending");

    let first = post_quote_status(&app, quote.document_id, "rejected").await;
    assert_status(&first, StatusCode::OK);

    let second = post_quote_status(&app, quote.document_id, "accepted").await;
    assert_status(&second, StatusCode::CONFLICT);
    assert_eq!(app.store.document_status(quote.document_id), "rejected");
}

#[tokio::test]
async fn test_repeating_a_terminal_status_is_a_conflict() {
    let app = spawn_app();
    let quote = seed_quote(&app, "pending");

    let first = post_quote_status(&app, quote.document_id, "accepted").await;
    assert_status(&first, StatusCode::OK);

    let second = post_quote_status(&app, quote.document_id, "accepted").await;
    assert_status(&second, StatusCode::CONFLICT);
    assert_eq!(app.store.document_status(quote.document_id), "accepted");
}

#[tokio::test]
async fn test_unknown_status_label_is_bad_request_without_mutation() {
    let app = spawn_app();
    let quote = seed_quote(&app, "pending");

    let response = post_quote_status(&app, quote.document_id, "Approved").await;

    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.document_status(quote.document_id), "pending");
}

#[tokio::test]
async fn test_invoice_status_on_a_quote_is_bad_request() {
    let app = spawn_app();
    let quote = seed_quote(&app, "pending");

    let response = post_quote_status(&app, quote.document_id, "paid").await;

    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.document_status(quote.document_id), "pending");
}

#[tokio::test]
async fn test_pending_is_not_a_requestable_target() {
    let app = spawn_app();
    let quote = seed_quote(&app, "pending");

    let response = post_quote_status(&app, quote.document_id, "pending").await;

    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.document_status(quote.document_id), "pending");
}

#[tokio::test]
async fn test_unknown_quote_is_not_found() {
    let app = spawn_app();

    let response = post_quote_status(&app, uuid::Uuid::new_v4(), "accepted").await;

    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invoice_id_on_the_quote_endpoint_is_not_found() {
    let app = spawn_app();
    let invoice = seed_invoice(&app, "unpaid");

    let response = post_quote_status(&app, invoice.document_id, "accepted").await;

    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(app.store.document_status(invoice.document_id), "unpaid");
}

#[tokio::test]
async fn test_quote_transition_emits_no_payment_records() {
    let app = spawn_app();
    let quote = seed_quote(&app, "pending");

    let response = post_quote_status(&app, quote.document_id, "accepted").await;
    assert_status(&response, StatusCode::OK);

    assert_eq!(app.store.payment_count(), 0);
    assert_eq!(app.store.notification_count(), 0);
}

#[tokio::test]
async fn test_store_failure_surfaces_as_server_error() {
    let app = spawn_app();
    let quote = seed_quote(&app, "pending");
    app.store.fail_writes();

    let response = post_quote_status(&app, quote.document_id, "accepted").await;

    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
}
