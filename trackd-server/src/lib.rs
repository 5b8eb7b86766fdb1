//! trackd server - analytics backend for UK trade businesses
//!
//! # Architecture overview
//!
//! - **HTTP API** (`api`): axum routers, one module per resource
//! - **Identity** (`auth`): trusted-header identity from the fronting auth proxy
//! - **Database** (`db`): SQLite via sqlx, plain-SQL repositories
//! - **Analytics** (`analytics`): dashboard aggregations over jobs
//! - **Tiers** (`tiers`): remote tier catalog with cache + fallback, quota checks
//! - **Billing** (`billing`): Stripe checkout, subscription sync, webhooks
//! - **AI** (`ai`): language-model market analysis
//!
//! # Module structure
//!
//! ```text
//! trackd-server/src/
//! ├── core/          # config, state, server assembly
//! ├── auth/          # identity middleware and extractor
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # pool setup, migrations, repositories
//! ├── analytics/     # metric aggregation
//! ├── tiers/         # tier source, cache, entitlements
//! ├── billing/       # payment provider client and orchestration
//! ├── ai/            # analysis client
//! └── utils/         # errors, validation, money, logging
//! ```

pub mod ai;
pub mod analytics;
pub mod api;
pub mod auth;
pub mod billing;
pub mod core;
pub mod db;
pub mod tiers;
pub mod utils;

// Re-export common types
pub use auth::CurrentUser;
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// Load `.env`, create the work directory tree and initialize logging.
/// Called once at startup, before anything logs.
pub fn setup_environment() -> anyhow::Result<()> {
    use anyhow::Context;

    dotenv::dotenv().ok();
    let config = Config::from_env();
    config
        .ensure_work_dir_structure()
        .with_context(|| format!("creating work directory structure under {}", config.work_dir))?;
    let log_dir = config.log_dir();
    init_logger_with_file(None, config.is_production(), Some(log_dir.as_path()))
        .context("initializing logger")?;
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   __                       __       __
  / /_  _________ _ _____  / /__ ____/ /
 / __/ / ___/ __ `// ___/ / //_// __  /
/ /_  / /  / /_/ // /__  / ,<  / /_/ /
\__/ /_/   \__,_/ \___/ /_/|_| \__,_/
    "#
    );
}
