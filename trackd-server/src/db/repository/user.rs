//! User Repository

use sqlx::SqlitePool;

use shared::models::{User, UserUpdate};
use shared::util::now_millis;

use super::{RepoError, RepoResult};

const USER_SELECT: &str = "SELECT id, email, name, business_type, specializations, target_hourly_rate, revenue_goal, hours_goal, subscription_tier, preferred_currency, notification_preferences, created_at, updated_at FROM users";

/// Raw row with JSON columns still as TEXT.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: Option<String>,
    business_type: Option<String>,
    specializations: String,
    target_hourly_rate: Option<f64>,
    revenue_goal: Option<f64>,
    hours_goal: Option<f64>,
    subscription_tier: String,
    preferred_currency: String,
    notification_preferences: String,
    created_at: i64,
    updated_at: i64,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            email: r.email,
            name: r.name,
            business_type: r.business_type,
            specializations: serde_json::from_str(&r.specializations).unwrap_or_default(),
            target_hourly_rate: r.target_hourly_rate,
            revenue_goal: r.revenue_goal,
            hours_goal: r.hours_goal,
            subscription_tier: r.subscription_tier,
            preferred_currency: r.preferred_currency,
            notification_preferences: serde_json::from_str(&r.notification_preferences)
                .unwrap_or_default(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(User::from))
}

/// Upsert on first authenticated request. Refreshes the stored email when
/// the auth provider reports a new one, without bumping `updated_at`.
pub async fn ensure(pool: &SqlitePool, id: &str, email: &str) -> RepoResult<User> {
    let now = now_millis();
    sqlx::query(
        "INSERT INTO users (id, email, created_at, updated_at) VALUES (?1, ?2, ?3, ?3) \
         ON CONFLICT(id) DO UPDATE SET email = excluded.email WHERE users.email <> excluded.email",
    )
    .bind(id)
    .bind(email)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to ensure user".into()))
}

pub async fn update(pool: &SqlitePool, id: &str, data: UserUpdate) -> RepoResult<User> {
    let now = now_millis();
    let specializations = data
        .specializations
        .as_ref()
        .map(|list| serde_json::to_string(list).unwrap_or_else(|_| "[]".into()));
    let preferences = data
        .notification_preferences
        .as_ref()
        .map(|p| serde_json::to_string(p).unwrap_or_else(|_| "{}".into()));

    let rows = sqlx::query(
        "UPDATE users SET name = COALESCE(?1, name), business_type = COALESCE(?2, business_type), specializations = COALESCE(?3, specializations), target_hourly_rate = COALESCE(?4, target_hourly_rate), revenue_goal = COALESCE(?5, revenue_goal), hours_goal = COALESCE(?6, hours_goal), preferred_currency = COALESCE(?7, preferred_currency), notification_preferences = COALESCE(?8, notification_preferences), updated_at = ?9 WHERE id = ?10",
    )
    .bind(&data.name)
    .bind(&data.business_type)
    .bind(&specializations)
    .bind(data.target_hourly_rate)
    .bind(data.revenue_goal)
    .bind(data.hours_goal)
    .bind(&data.preferred_currency)
    .bind(&preferences)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

/// Mirror the subscription tier onto the user row so profile reads don't
/// need a billing join.
pub async fn set_tier(pool: &SqlitePool, id: &str, tier: &str) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query("UPDATE users SET subscription_tier = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(tier)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
