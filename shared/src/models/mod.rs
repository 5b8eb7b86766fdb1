//! Data models
//!
//! Shared between trackd-server and the dashboard frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Record IDs are `i64` snowflakes; user IDs are the auth provider's
//! opaque subject strings. Wire names are camelCase.

pub mod competitor;
pub mod customer;
pub mod insight;
pub mod job;
pub mod subscription;
pub mod tier;
pub mod user;

// Re-exports
pub use competitor::*;
pub use customer::*;
pub use insight::*;
pub use job::*;
pub use subscription::*;
pub use tier::*;
pub use user::*;
