//! Billing API module
//!
//! The webhook route is the one unauthenticated path under `/api/`;
//! it proves itself with the payload signature instead.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/stripe", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/create-checkout-session", post(handler::create_checkout_session))
        .route("/checkout-success", post(handler::checkout_success))
        .route("/cancel-subscription", post(handler::cancel_subscription))
        .route("/reactivate-subscription", post(handler::reactivate_subscription))
        .route("/subscription/{user_id}", get(handler::get_subscription))
        .route("/webhook", post(handler::webhook))
}
