//! Identity middleware
//!
//! Resolves the proxy-forwarded identity headers for every `/api/`
//! request and injects [`CurrentUser`] into the request extensions
//! (`req.extensions_mut().insert(user)`). The user row is upserted on
//! each request so a first-time caller exists before any handler runs.
//!
//! # Paths that skip identity
//!
//! - `OPTIONS *` (CORS preflight)
//! - non-`/api/` paths (health checks)
//! - `/api/stripe/webhook` (authenticated by its own signature scheme)

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::AppError;

pub async fn require_identity(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // CORS preflight requests carry no identity headers
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Non-API routes (health, 404s) stay public
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // The webhook proves itself with a payload signature instead
    if path == "/api/stripe/webhook" {
        return Ok(next.run(req).await);
    }

    let user_id = req
        .headers()
        .get("x-user-id")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from);

    let Some(user_id) = user_id else {
        warn!(target: "security", uri = %req.uri(), "API request without identity header");
        return Err(AppError::Unauthorized);
    };

    let email = req
        .headers()
        .get("x-user-email")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();

    let user = user::ensure(state.pool(), &user_id, &email).await?;
    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
    });

    Ok(next.run(req).await)
}
