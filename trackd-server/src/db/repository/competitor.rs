//! Competitor Repository

use sqlx::SqlitePool;

use shared::models::{Competitor, CompetitorCreate, CompetitorUpdate};
use shared::util::{now_millis, snowflake_id};

use super::{RepoError, RepoResult};

const COMPETITOR_SELECT: &str = "SELECT id, user_id, name, hourly_rate, emergency_rate, services, rating, review_count, location, is_active, notes, created_at, updated_at FROM competitors";

/// Raw row with the JSON services column still as TEXT.
#[derive(sqlx::FromRow)]
struct CompetitorRow {
    id: i64,
    user_id: String,
    name: String,
    hourly_rate: Option<f64>,
    emergency_rate: Option<f64>,
    services: String,
    rating: Option<f64>,
    review_count: Option<i64>,
    location: Option<String>,
    is_active: bool,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<CompetitorRow> for Competitor {
    fn from(r: CompetitorRow) -> Self {
        Competitor {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            hourly_rate: r.hourly_rate,
            emergency_rate: r.emergency_rate,
            services: serde_json::from_str(&r.services).unwrap_or_default(),
            rating: r.rating,
            review_count: r.review_count,
            location: r.location,
            is_active: r.is_active,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub async fn find_all(
    pool: &SqlitePool,
    user_id: &str,
    active: Option<bool>,
) -> RepoResult<Vec<Competitor>> {
    let sql = format!(
        "{COMPETITOR_SELECT} WHERE user_id = ?1 AND (?2 IS NULL OR is_active = ?2) ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, CompetitorRow>(&sql)
        .bind(user_id)
        .bind(active)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Competitor::from).collect())
}

pub async fn find_by_id(
    pool: &SqlitePool,
    user_id: &str,
    id: i64,
) -> RepoResult<Option<Competitor>> {
    let sql = format!("{COMPETITOR_SELECT} WHERE user_id = ? AND id = ?");
    let row = sqlx::query_as::<_, CompetitorRow>(&sql)
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Competitor::from))
}

pub async fn create(
    pool: &SqlitePool,
    user_id: &str,
    data: CompetitorCreate,
) -> RepoResult<Competitor> {
    let now = now_millis();
    let id = snowflake_id();
    let services =
        serde_json::to_string(&data.services.unwrap_or_default()).unwrap_or_else(|_| "[]".into());
    sqlx::query(
        "INSERT INTO competitors (id, user_id, name, hourly_rate, emergency_rate, services, rating, review_count, location, is_active, notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?11, ?11)",
    )
    .bind(id)
    .bind(user_id)
    .bind(&data.name)
    .bind(data.hourly_rate)
    .bind(data.emergency_rate)
    .bind(&services)
    .bind(data.rating)
    .bind(data.review_count)
    .bind(&data.location)
    .bind(&data.notes)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create competitor".into()))
}

pub async fn update(
    pool: &SqlitePool,
    user_id: &str,
    id: i64,
    data: CompetitorUpdate,
) -> RepoResult<Competitor> {
    let now = now_millis();
    let services = data
        .services
        .as_ref()
        .map(|list| serde_json::to_string(list).unwrap_or_else(|_| "[]".into()));
    let rows = sqlx::query(
        "UPDATE competitors SET name = COALESCE(?1, name), hourly_rate = COALESCE(?2, hourly_rate), emergency_rate = COALESCE(?3, emergency_rate), services = COALESCE(?4, services), rating = COALESCE(?5, rating), review_count = COALESCE(?6, review_count), location = COALESCE(?7, location), is_active = COALESCE(?8, is_active), notes = COALESCE(?9, notes), updated_at = ?10 WHERE user_id = ?11 AND id = ?12",
    )
    .bind(&data.name)
    .bind(data.hourly_rate)
    .bind(data.emergency_rate)
    .bind(&services)
    .bind(data.rating)
    .bind(data.review_count)
    .bind(&data.location)
    .bind(data.is_active)
    .bind(&data.notes)
    .bind(now)
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Competitor {id} not found")));
    }
    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Competitor {id} not found")))
}

pub async fn delete(pool: &SqlitePool, user_id: &str, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM competitors WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Active competitors count toward the tier quota; deactivated ones don't.
pub async fn count_active(pool: &SqlitePool, user_id: &str) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM competitors WHERE user_id = ? AND is_active = 1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    fn competitor_input(name: &str, hourly_rate: Option<f64>) -> CompetitorCreate {
        CompetitorCreate {
            name: name.into(),
            hourly_rate,
            emergency_rate: None,
            services: Some(vec!["boilers".into()]),
            rating: Some(4.2),
            review_count: Some(31),
            location: Some("Leeds".into()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_active() {
        let pool = test_pool().await;
        let competitor = create(&pool, "u1", competitor_input("FastFlow Ltd", Some(85.0)))
            .await
            .unwrap();
        assert!(competitor.is_active);
        assert_eq!(competitor.services, vec!["boilers"]);
        assert_eq!(competitor.hourly_rate, Some(85.0));
    }

    #[tokio::test]
    async fn test_update_can_deactivate() {
        let pool = test_pool().await;
        let competitor = create(&pool, "u1", competitor_input("FastFlow Ltd", Some(85.0)))
            .await
            .unwrap();
        let updated = update(
            &pool,
            "u1",
            competitor.id,
            CompetitorUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.name, "FastFlow Ltd");
    }

    #[tokio::test]
    async fn test_find_all_active_filter() {
        let pool = test_pool().await;
        let first = create(&pool, "u1", competitor_input("FastFlow Ltd", None)).await.unwrap();
        create(&pool, "u1", competitor_input("DrainRight", None)).await.unwrap();
        update(
            &pool,
            "u1",
            first.id,
            CompetitorUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(find_all(&pool, "u1", None).await.unwrap().len(), 2);
        let active = find_all(&pool, "u1", Some(true)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "DrainRight");
        assert_eq!(find_all(&pool, "u1", Some(false)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_count_active_skips_inactive_and_other_users() {
        let pool = test_pool().await;
        let first = create(&pool, "u1", competitor_input("FastFlow Ltd", None)).await.unwrap();
        create(&pool, "u1", competitor_input("DrainRight", None)).await.unwrap();
        create(&pool, "u2", competitor_input("Someone Else", None)).await.unwrap();

        assert_eq!(count_active(&pool, "u1").await.unwrap(), 2);

        update(
            &pool,
            "u1",
            first.id,
            CompetitorUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(count_active(&pool, "u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_user_scoped() {
        let pool = test_pool().await;
        let competitor = create(&pool, "u1", competitor_input("FastFlow Ltd", None))
            .await
            .unwrap();
        assert!(!delete(&pool, "u2", competitor.id).await.unwrap());
        assert!(delete(&pool, "u1", competitor.id).await.unwrap());
    }
}
