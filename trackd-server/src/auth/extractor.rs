//! Identity extractor
//!
//! Lets protected handlers take `user: CurrentUser` as a parameter.
//! Normally the middleware has already stored the identity in the
//! request extensions; the header fallback covers routers built
//! without it.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by the middleware
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let Some(user_id) = user_id else {
            warn!(target: "security", uri = %parts.uri, "Handler reached without identity");
            return Err(AppError::Unauthorized);
        };

        let email = parts
            .headers
            .get("x-user-email")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        let user = CurrentUser {
            id: user_id.to_string(),
            email: email.to_string(),
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
