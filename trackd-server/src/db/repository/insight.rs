//! Insight Repository
//!
//! Insights only move forward: once completed or dismissed they never
//! return to active. The viewed flag feeds the notification badge.

use sqlx::SqlitePool;

use shared::models::{Insight, InsightCreate, InsightStatus, InsightUpdate};
use shared::util::{now_millis, snowflake_id};

use super::{RepoError, RepoResult};

const INSIGHT_SELECT: &str = "SELECT id, user_id, category, title, body, priority, status, viewed, created_at, updated_at FROM insights";

pub async fn find_all(
    pool: &SqlitePool,
    user_id: &str,
    status: Option<InsightStatus>,
) -> RepoResult<Vec<Insight>> {
    let sql = format!(
        "{INSIGHT_SELECT} WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2) ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, Insight>(&sql)
        .bind(user_id)
        .bind(status)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, user_id: &str, id: i64) -> RepoResult<Option<Insight>> {
    let sql = format!("{INSIGHT_SELECT} WHERE user_id = ? AND id = ?");
    let row = sqlx::query_as::<_, Insight>(&sql)
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, user_id: &str, data: InsightCreate) -> RepoResult<Insight> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO insights (id, user_id, category, title, body, priority, status, viewed, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)",
    )
    .bind(id)
    .bind(user_id)
    .bind(data.category)
    .bind(&data.title)
    .bind(&data.body)
    .bind(data.priority.unwrap_or_default())
    .bind(InsightStatus::Active)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create insight".into()))
}

pub async fn update(
    pool: &SqlitePool,
    user_id: &str,
    id: i64,
    data: InsightUpdate,
) -> RepoResult<Insight> {
    let old = find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Insight {id} not found")))?;

    // Completed/dismissed insights never reopen
    if data.status == Some(InsightStatus::Active) && old.status != InsightStatus::Active {
        return Err(RepoError::Validation(
            "Insight cannot be reopened once completed or dismissed".into(),
        ));
    }

    let now = now_millis();
    sqlx::query(
        "UPDATE insights SET title = COALESCE(?1, title), body = COALESCE(?2, body), priority = COALESCE(?3, priority), status = COALESCE(?4, status), updated_at = ?5 WHERE user_id = ?6 AND id = ?7",
    )
    .bind(&data.title)
    .bind(&data.body)
    .bind(data.priority)
    .bind(data.status)
    .bind(now)
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Insight {id} not found")))
}

pub async fn delete(pool: &SqlitePool, user_id: &str, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM insights WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Notification badge: active insights the user hasn't opened yet.
pub async fn unviewed_count(pool: &SqlitePool, user_id: &str) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM insights WHERE user_id = ? AND viewed = 0 AND status = 'active'",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn mark_viewed(pool: &SqlitePool, user_id: &str, id: i64) -> RepoResult<()> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE insights SET viewed = 1, updated_at = ?1 WHERE user_id = ?2 AND id = ?3",
    )
    .bind(now)
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Insight {id} not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;
    use shared::models::{InsightCategory, InsightPriority};

    fn insight_input(title: &str) -> InsightCreate {
        InsightCreate {
            category: InsightCategory::Pricing,
            title: title.into(),
            body: "Your emergency call-out rate trails the local market.".into(),
            priority: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let pool = test_pool().await;
        let insight = create(&pool, "u1", insight_input("Raise call-out rate")).await.unwrap();
        assert_eq!(insight.status, InsightStatus::Active);
        assert_eq!(insight.priority, InsightPriority::Medium);
        assert!(!insight.viewed);
    }

    #[tokio::test]
    async fn test_status_moves_forward_only() {
        let pool = test_pool().await;
        let insight = create(&pool, "u1", insight_input("Raise call-out rate")).await.unwrap();

        let done = update(
            &pool,
            "u1",
            insight.id,
            InsightUpdate {
                status: Some(InsightStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(done.status, InsightStatus::Completed);

        // Reopening is rejected
        let result = update(
            &pool,
            "u1",
            insight.id,
            InsightUpdate {
                status: Some(InsightStatus::Active),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(RepoError::Validation(_))));
    }

    #[tokio::test]
    async fn test_find_all_status_filter() {
        let pool = test_pool().await;
        let first = create(&pool, "u1", insight_input("Raise call-out rate")).await.unwrap();
        create(&pool, "u1", insight_input("Bundle boiler services")).await.unwrap();
        update(
            &pool,
            "u1",
            first.id,
            InsightUpdate {
                status: Some(InsightStatus::Dismissed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(find_all(&pool, "u1", None).await.unwrap().len(), 2);
        let active = find_all(&pool, "u1", Some(InsightStatus::Active)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Bundle boiler services");
    }

    #[tokio::test]
    async fn test_active_to_active_is_a_noop_not_an_error() {
        let pool = test_pool().await;
        let insight = create(&pool, "u1", insight_input("Raise call-out rate")).await.unwrap();
        let same = update(
            &pool,
            "u1",
            insight.id,
            InsightUpdate {
                status: Some(InsightStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(same.status, InsightStatus::Active);
    }

    #[tokio::test]
    async fn test_unviewed_count_and_mark_viewed() {
        let pool = test_pool().await;
        let first = create(&pool, "u1", insight_input("One")).await.unwrap();
        create(&pool, "u1", insight_input("Two")).await.unwrap();
        let dismissed = create(&pool, "u1", insight_input("Three")).await.unwrap();
        create(&pool, "u2", insight_input("Other user")).await.unwrap();

        // Dismissed-unviewed insights don't notify
        update(
            &pool,
            "u1",
            dismissed.id,
            InsightUpdate {
                status: Some(InsightStatus::Dismissed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(unviewed_count(&pool, "u1").await.unwrap(), 2);

        mark_viewed(&pool, "u1", first.id).await.unwrap();
        assert_eq!(unviewed_count(&pool, "u1").await.unwrap(), 1);

        // Marking twice stays settled
        mark_viewed(&pool, "u1", first.id).await.unwrap();
        assert_eq!(unviewed_count(&pool, "u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_viewed_is_user_scoped() {
        let pool = test_pool().await;
        let insight = create(&pool, "u1", insight_input("One")).await.unwrap();
        let result = mark_viewed(&pool, "u2", insight.id).await;
        assert!(matches!(result, Err(RepoError::NotFound(_))));
    }
}
