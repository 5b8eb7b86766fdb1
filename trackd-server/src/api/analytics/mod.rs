//! Analytics API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/analytics", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/dashboard", get(handler::dashboard))
        .route("/efficiency", get(handler::efficiency))
        .route("/customer-ranking", get(handler::customer_ranking))
        .route("/seasonal-trends", get(handler::seasonal_trends))
        .route("/competitor-comparison", get(handler::competitor_comparison))
}
