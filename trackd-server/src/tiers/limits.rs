//! Tier entitlement checks
//!
//! Answers "can this user create one more X" by counting what they
//! actually have against the limits of their tier. Jobs count per
//! calendar month, competitors count live active rows, AI analyses
//! count from the monthly usage ledger.

use sqlx::SqlitePool;

use shared::models::{LimitCheck, LimitKind};
use shared::util::current_period;

use crate::db::repository::{competitor, job, usage, user};
use crate::tiers::TierService;
use crate::utils::{AppError, AppResult};

/// Compare current usage for one quota dimension against the tier's
/// limit. A tier name the service doesn't know is always denied.
pub async fn check_limit(
    pool: &SqlitePool,
    tiers: &TierService,
    user_id: &str,
    tier_name: &str,
    kind: LimitKind,
) -> AppResult<LimitCheck> {
    let Some(tier) = tiers.get_tier(tier_name).await else {
        return Ok(LimitCheck {
            allowed: false,
            limit: None,
            current: 0,
            message: format!("invalid tier: {tier_name}"),
        });
    };

    let period = current_period();
    let (limit, current) = match kind {
        LimitKind::Jobs => (
            tier.max_jobs_per_month,
            job::count_in_month(pool, user_id, &period).await?,
        ),
        LimitKind::Ai => (
            Some(tier.ai_credits_per_month),
            usage::get_ai_uses(pool, user_id, &period).await?,
        ),
        LimitKind::Competitors => (
            Some(tier.max_competitors),
            competitor::count_active(pool, user_id).await?,
        ),
    };

    let allowed = limit.is_none_or(|max| current < max);
    let message = match limit {
        None => "unlimited".to_string(),
        Some(max) if allowed => format!("{current} of {max} used"),
        Some(max) => format!("limit reached: {current} of {max} used"),
    };

    Ok(LimitCheck {
        allowed,
        limit,
        current,
        message,
    })
}

/// Gate for create operations: resolves the caller's tier and fails
/// with a business-rule error when the quota is exhausted.
pub async fn enforce(
    pool: &SqlitePool,
    tiers: &TierService,
    user_id: &str,
    kind: LimitKind,
) -> AppResult<()> {
    let tier_name = user::find_by_id(pool, user_id)
        .await?
        .map(|u| u.subscription_tier)
        .unwrap_or_else(|| "trial".to_string());

    let check = check_limit(pool, tiers, user_id, &tier_name, kind).await?;
    if !check.allowed {
        return Err(AppError::business_rule(check.message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;
    use shared::models::{CompetitorCreate, CompetitorUpdate, JobCreate};

    fn job_input(date: &str) -> JobCreate {
        JobCreate {
            customer_id: None,
            customer_name: "Mrs Hughes".into(),
            job_type: "Boiler service".into(),
            revenue: 100.0,
            expenses: None,
            hours: 2.0,
            hourly_rate: None,
            status: None,
            date: date.into(),
            satisfaction: None,
            materials: None,
            notes: None,
        }
    }

    fn competitor_input(name: &str) -> CompetitorCreate {
        CompetitorCreate {
            name: name.into(),
            hourly_rate: Some(50.0),
            emergency_rate: None,
            services: None,
            rating: None,
            review_count: None,
            location: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_unknown_tier_is_denied() {
        let pool = test_pool().await;
        let tiers = TierService::new(None);
        let check = check_limit(&pool, &tiers, "u1", "enterprise", LimitKind::Jobs)
            .await
            .unwrap();
        assert!(!check.allowed);
        assert_eq!(check.limit, None);
        assert_eq!(check.message, "invalid tier: enterprise");
    }

    #[tokio::test]
    async fn test_jobs_counted_in_current_month_only() {
        let pool = test_pool().await;
        let tiers = TierService::new(None);
        let this_month = format!("{}-15", current_period());

        for _ in 0..3 {
            job::create(&pool, "u1", job_input(&this_month)).await.unwrap();
        }
        // An old job must not count against this month's quota
        job::create(&pool, "u1", job_input("2020-01-15")).await.unwrap();

        let check = check_limit(&pool, &tiers, "u1", "trial", LimitKind::Jobs)
            .await
            .unwrap();
        assert!(check.allowed);
        assert_eq!(check.limit, Some(25));
        assert_eq!(check.current, 3);
        assert_eq!(check.message, "3 of 25 used");
    }

    #[tokio::test]
    async fn test_competitor_quota_tracks_active_rows() {
        let pool = test_pool().await;
        let tiers = TierService::new(None);

        let mut last_id = 0;
        for n in 0..3 {
            let c = competitor::create(&pool, "u1", competitor_input(&format!("Rival {n}")))
                .await
                .unwrap();
            last_id = c.id;
        }

        let check = check_limit(&pool, &tiers, "u1", "trial", LimitKind::Competitors)
            .await
            .unwrap();
        assert!(!check.allowed);
        assert_eq!(check.current, 3);
        assert_eq!(check.message, "limit reached: 3 of 3 used");

        // Deactivating one frees a slot without deleting the record
        competitor::update(
            &pool,
            "u1",
            last_id,
            CompetitorUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let check = check_limit(&pool, &tiers, "u1", "trial", LimitKind::Competitors)
            .await
            .unwrap();
        assert!(check.allowed);
        assert_eq!(check.current, 2);
    }

    #[tokio::test]
    async fn test_ai_credits_follow_usage_ledger() {
        let pool = test_pool().await;
        let tiers = TierService::new(None);
        let period = current_period();

        for _ in 0..5 {
            usage::record_ai_use(&pool, "u1", &period).await.unwrap();
        }

        let trial = check_limit(&pool, &tiers, "u1", "trial", LimitKind::Ai)
            .await
            .unwrap();
        assert!(!trial.allowed);
        assert_eq!(trial.current, 5);
        assert_eq!(trial.limit, Some(5));

        // Same usage under a bigger tier is fine
        let basic = check_limit(&pool, &tiers, "u1", "basic", LimitKind::Ai)
            .await
            .unwrap();
        assert!(basic.allowed);
        assert_eq!(basic.current, 5);
        assert_eq!(basic.limit, Some(25));
    }

    #[tokio::test]
    async fn test_pro_jobs_are_unlimited() {
        let pool = test_pool().await;
        let tiers = TierService::new(None);
        let this_month = format!("{}-10", current_period());

        for _ in 0..30 {
            job::create(&pool, "u1", job_input(&this_month)).await.unwrap();
        }

        let check = check_limit(&pool, &tiers, "u1", "pro", LimitKind::Jobs)
            .await
            .unwrap();
        assert!(check.allowed);
        assert_eq!(check.limit, None);
        assert_eq!(check.current, 30);
        assert_eq!(check.message, "unlimited");
    }

    #[tokio::test]
    async fn test_enforce_blocks_with_business_rule() {
        let pool = test_pool().await;
        let tiers = TierService::new(None);
        user::ensure(&pool, "u1", "test@example.com").await.unwrap();

        for n in 0..3 {
            competitor::create(&pool, "u1", competitor_input(&format!("Rival {n}")))
                .await
                .unwrap();
        }

        let err = enforce(&pool, &tiers, "u1", LimitKind::Competitors)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        // Upgrading the user raises the cap
        user::set_tier(&pool, "u1", "basic").await.unwrap();
        enforce(&pool, &tiers, "u1", LimitKind::Competitors)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_enforce_defaults_missing_user_to_trial() {
        let pool = test_pool().await;
        let tiers = TierService::new(None);

        // No user row yet: trial limits apply
        enforce(&pool, &tiers, "ghost", LimitKind::Jobs).await.unwrap();
    }
}
