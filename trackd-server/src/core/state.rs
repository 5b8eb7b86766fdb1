use sqlx::SqlitePool;

use crate::ai::AnalysisClient;
use crate::billing::{BillingService, StripeClient};
use crate::core::Config;
use crate::tiers::{TierService, TierSource};

/// Server state - shared handle to every service
///
/// Cloned per request by axum; all fields are cheap shallow copies.
///
/// | Field | Type | Role |
/// |-------|------|------|
/// | config | Config | Settings (immutable) |
/// | pool | SqlitePool | SQLite connection pool |
/// | tiers | TierService | Tier table cache + fallback |
/// | billing | BillingService | Checkout / webhook orchestration |
/// | analysis | AnalysisClient | AI analysis gateway |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub tiers: TierService,
    pub billing: BillingService,
    pub analysis: AnalysisClient,
}

impl ServerState {
    /// Initialize the full server state:
    ///
    /// 1. work_dir layout (database and log directories)
    /// 2. SQLite pool and migrations
    /// 3. Services (tiers, billing, analysis)
    ///
    /// # Panics
    ///
    /// Panics when the work directory or database cannot be initialized.
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let pool = crate::db::connect(&config.database_file())
            .await
            .expect("Failed to initialize database");

        Self::with_pool(config.clone(), pool)
    }

    /// Wire services onto an existing pool. Tests hand in an in-memory
    /// pool here.
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        // Both URL and key must be present for the remote source
        let source = match (&config.tier_source_url, &config.tier_source_key) {
            (Some(url), Some(key)) => {
                Some(TierSource::new(url.clone(), key.clone(), config.tier_source_table.clone()))
            }
            _ => None,
        };
        let tiers = TierService::new(source);

        let stripe = StripeClient::new(config.stripe_secret_key.clone(), config.stripe_api_base.clone());
        let billing = BillingService::new(
            stripe,
            tiers.clone(),
            config.checkout_success_url.clone(),
            config.checkout_cancel_url.clone(),
        );

        let analysis = AnalysisClient::new(
            config.anthropic_api_key.clone(),
            config.anthropic_model.clone(),
            config.anthropic_api_base.clone(),
        );

        Self {
            config,
            pool,
            tiers,
            billing,
            analysis,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
