//! API route modules
//!
//! One module per resource: `mod.rs` builds the router, `handler.rs`
//! holds the handlers. Everything under `/api/` runs behind the
//! identity middleware except the Stripe webhook, which authenticates
//! with a payload signature instead.
//!
//! # Structure
//!
//! - [`health`] - liveness and component checks (public)
//! - [`users`] - profile read/update
//! - [`config`] - tier catalog and entitlement checks
//! - [`jobs`] - job CRUD and filters
//! - [`customers`] - customer CRUD and search
//! - [`competitors`] - competitor CRUD
//! - [`insights`] - insight CRUD, view tracking
//! - [`analytics`] - dashboard aggregations
//! - [`ai`] - AI-backed market analysis
//! - [`stripe`] - checkout, subscription management, webhooks

pub mod health;

pub mod config;
pub mod users;

// Business records
pub mod competitors;
pub mod customers;
pub mod insights;
pub mod jobs;

// Aggregations and paid features
pub mod ai;
pub mod analytics;
pub mod stripe;
