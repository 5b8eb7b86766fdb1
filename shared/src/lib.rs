//! Shared types for the trackd platform
//!
//! Data models exchanged between trackd-server and the dashboard frontend,
//! plus id/time utilities. Database row derives are gated behind the `db`
//! feature so the models stay lightweight for API consumers.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
