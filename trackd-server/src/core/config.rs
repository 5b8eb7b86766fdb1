use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// Every setting can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/trackd | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | DATABASE_PATH | work_dir/database/trackd.db | SQLite file override |
/// | TIER_SOURCE_URL | (unset) | Remote tier table base URL |
/// | TIER_SOURCE_KEY | (unset) | Bearer key for the tier table |
/// | TIER_SOURCE_TABLE | tiers | Table name under the base URL |
/// | STRIPE_SECRET_KEY | (unset) | Payment API key; unset stubs billing |
/// | STRIPE_WEBHOOK_SECRET | (unset) | Webhook signature secret |
/// | STRIPE_API_BASE | https://api.stripe.com | Payment API base URL |
/// | ANTHROPIC_API_KEY | (unset) | Model API key; unset disables analysis |
/// | ANTHROPIC_MODEL | claude-3-5-haiku-latest | Model used for analysis |
/// | ANTHROPIC_API_BASE | https://api.anthropic.com | Model API base URL |
/// | CHECKOUT_SUCCESS_URL | http://localhost:5173/billing/success | Checkout return URL |
/// | CHECKOUT_CANCEL_URL | http://localhost:5173/billing | Checkout abandon URL |
/// | ENVIRONMENT | development | development \| staging \| production |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/trackd HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Explicit SQLite file path, overriding the work_dir layout
    pub database_path: Option<String>,
    /// Run environment: development | staging | production
    pub environment: String,

    // === Tier source ===
    /// Remote tier table base URL; None serves the built-in fallback
    pub tier_source_url: Option<String>,
    /// Bearer key for the tier table
    pub tier_source_key: Option<String>,
    /// Table name appended to the base URL
    pub tier_source_table: String,

    // === Billing ===
    /// Payment API secret key; None runs billing in stub mode
    pub stripe_secret_key: Option<String>,
    /// Webhook signature secret
    pub stripe_webhook_secret: Option<String>,
    /// Payment API base URL (overridden in tests)
    pub stripe_api_base: String,
    /// Where checkout sends the user on success
    pub checkout_success_url: String,
    /// Where checkout sends the user on abandon
    pub checkout_cancel_url: String,

    // === AI analysis ===
    /// Model API key; None reports the feature unavailable
    pub anthropic_api_key: Option<String>,
    /// Model used for competitor and pricing analysis
    pub anthropic_model: String,
    /// Model API base URL (overridden in tests)
    pub anthropic_api_base: String,
}

/// Empty values count as unset so `VAR= cargo run` behaves like no VAR.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from the environment, filling defaults.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/trackd".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: env_opt("DATABASE_PATH"),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            tier_source_url: env_opt("TIER_SOURCE_URL"),
            tier_source_key: env_opt("TIER_SOURCE_KEY"),
            tier_source_table: std::env::var("TIER_SOURCE_TABLE")
                .unwrap_or_else(|_| "tiers".into()),

            stripe_secret_key: env_opt("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: env_opt("STRIPE_WEBHOOK_SECRET"),
            stripe_api_base: std::env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".into()),
            checkout_success_url: std::env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:5173/billing/success".into()),
            checkout_cancel_url: std::env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:5173/billing".into()),

            anthropic_api_key: env_opt("ANTHROPIC_API_KEY"),
            anthropic_model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-5-haiku-latest".into()),
            anthropic_api_base: std::env::var("ANTHROPIC_API_BASE")
                .unwrap_or_else(|_| "https://api.anthropic.com".into()),
        }
    }

    /// SQLite file: explicit override or `work_dir/database/trackd.db`.
    pub fn database_file(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.work_dir).join("database").join("trackd.db"),
        }
    }

    /// Log directory: `work_dir/logs`.
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the work_dir layout (database and log directories).
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(PathBuf::from(&self.work_dir).join("database"))?;
        std::fs::create_dir_all(self.log_dir())?;
        if let Some(parent) = self.database_file().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
