//! Identity handling
//!
//! The server sits behind an auth proxy that terminates the real
//! authentication and forwards the verified subject in `X-User-Id`
//! (plus `X-User-Email` when known). [`middleware::require_identity`]
//! turns those headers into a [`CurrentUser`] request extension and
//! upserts the user row on the way through.

pub mod extractor;
pub mod middleware;

/// Identity of the authenticated caller, injected per request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}
