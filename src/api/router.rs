use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, book_availability, create_loan, customer_eligibility, get_loan, list_book_history,
    list_current, list_history, list_overdue, renew_loan, return_loan,
};

/// Creates the API router with all circulation endpoints
///
/// Command endpoints (Write operations):
/// - POST /loans - Issue a book to a customer
/// - POST /loans/:id/renew - Renew a loan once
/// - POST /loans/:id/return - Return a book
///
/// Query endpoints (Read operations):
/// - GET /loans/overdue - Overdue loans, oldest due date first
/// - GET /loans/:id - Loan details
/// - GET /customers/:id/loans/current - Open loans of a customer
/// - GET /customers/:id/loans/history - Closed loans of a customer
/// - GET /customers/:id/eligibility - Whether the customer may borrow more
/// - GET /books/:id/loans - Loan history of a book copy
/// - GET /books/:id/availability - Whether a book copy is on the shelf
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Command endpoints (Write operations)
        .route("/loans", post(create_loan))
        .route("/loans/:id/renew", post(renew_loan))
        .route("/loans/:id/return", post(return_loan))
        // Query endpoints (Read operations)
        .route("/loans/overdue", get(list_overdue))
        .route("/loans/:id", get(get_loan))
        .route("/customers/:id/loans/current", get(list_current))
        .route("/customers/:id/loans/history", get(list_history))
        .route("/customers/:id/eligibility", get(customer_eligibility))
        .route("/books/:id/loans", get(list_book_history))
        .route("/books/:id/availability", get(book_availability))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
