//! Tier configuration API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/config", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/tiers", get(handler::tiers))
        .route("/tiers/{tier_name}", get(handler::tier_by_name))
        .route("/check-limit", post(handler::check_limit))
}
