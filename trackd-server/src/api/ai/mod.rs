//! AI analysis API module

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/ai", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/competitor-analysis", post(handler::competitor_analysis))
        .route("/pricing-analysis", post(handler::pricing_analysis))
}
