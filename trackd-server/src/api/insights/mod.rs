//! Insight API module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/insights", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/unviewed-count", get(handler::unviewed_count))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/view", post(handler::mark_viewed))
}
