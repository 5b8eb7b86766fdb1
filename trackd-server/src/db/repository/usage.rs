//! Usage Counter Repository
//!
//! Per-user, per-month counters backing the AI credit quota. Quota
//! checks read the live count instead of trusting a client-reported
//! number.

use sqlx::SqlitePool;

use super::RepoResult;

/// AI analyses consumed in the given period ("YYYY-MM"). 0 when the
/// counter row does not exist yet.
pub async fn get_ai_uses(pool: &SqlitePool, user_id: &str, period: &str) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(ai_analyses), 0) FROM usage_counters WHERE user_id = ?1 AND period = ?2",
    )
    .bind(user_id)
    .bind(period)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Count one AI analysis against the period, creating the row on first use.
pub async fn record_ai_use(pool: &SqlitePool, user_id: &str, period: &str) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO usage_counters (user_id, period, ai_analyses) VALUES (?1, ?2, 1) ON CONFLICT(user_id, period) DO UPDATE SET ai_analyses = ai_analyses + 1",
    )
    .bind(user_id)
    .bind(period)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    #[tokio::test]
    async fn test_missing_counter_reads_zero() {
        let pool = test_pool().await;
        assert_eq!(get_ai_uses(&pool, "u1", "2025-03").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_increments() {
        let pool = test_pool().await;
        record_ai_use(&pool, "u1", "2025-03").await.unwrap();
        record_ai_use(&pool, "u1", "2025-03").await.unwrap();
        record_ai_use(&pool, "u1", "2025-03").await.unwrap();
        assert_eq!(get_ai_uses(&pool, "u1", "2025-03").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_periods_and_users_are_isolated() {
        let pool = test_pool().await;
        record_ai_use(&pool, "u1", "2025-03").await.unwrap();
        record_ai_use(&pool, "u1", "2025-04").await.unwrap();
        record_ai_use(&pool, "u2", "2025-03").await.unwrap();

        assert_eq!(get_ai_uses(&pool, "u1", "2025-03").await.unwrap(), 1);
        assert_eq!(get_ai_uses(&pool, "u1", "2025-04").await.unwrap(), 1);
        assert_eq!(get_ai_uses(&pool, "u2", "2025-03").await.unwrap(), 1);
        assert_eq!(get_ai_uses(&pool, "u2", "2025-04").await.unwrap(), 0);
    }
}
