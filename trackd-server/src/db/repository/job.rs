//! Job Repository
//!
//! Writes recompute two derived values: the job's own `hourly_rate`
//! (always revenue / hours, the client-supplied figure is advisory) and
//! the linked customer's materialized aggregates.

use sqlx::SqlitePool;

use shared::models::{Job, JobCreate, JobStatus, JobUpdate};
use shared::util::{now_millis, snowflake_id};

use super::{RepoError, RepoResult, customer};
use crate::utils::money;

const JOB_SELECT: &str = "SELECT id, user_id, customer_id, customer_name, job_type, revenue, expenses, hours, hourly_rate, status, date, satisfaction, materials, notes, created_at, updated_at FROM jobs";

/// Raw row with the JSON materials column still as TEXT.
#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    user_id: String,
    customer_id: Option<i64>,
    customer_name: String,
    job_type: String,
    revenue: f64,
    expenses: f64,
    hours: f64,
    hourly_rate: f64,
    status: JobStatus,
    date: String,
    satisfaction: Option<i32>,
    materials: String,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<JobRow> for Job {
    fn from(r: JobRow) -> Self {
        Job {
            id: r.id,
            user_id: r.user_id,
            customer_id: r.customer_id,
            customer_name: r.customer_name,
            job_type: r.job_type,
            revenue: r.revenue,
            expenses: r.expenses,
            hours: r.hours,
            hourly_rate: r.hourly_rate,
            status: r.status,
            date: r.date,
            satisfaction: r.satisfaction,
            materials: serde_json::from_str(&r.materials).unwrap_or_default(),
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Optional list filters, combined with AND. Date bounds are inclusive.
#[derive(Debug, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub customer_id: Option<i64>,
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn find_all(pool: &SqlitePool, user_id: &str, filter: &JobFilter) -> RepoResult<Vec<Job>> {
    let sql = format!(
        "{JOB_SELECT} WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2) AND (?3 IS NULL OR customer_id = ?3) AND (?4 IS NULL OR date >= ?4) AND (?5 IS NULL OR date <= ?5) ORDER BY date DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, JobRow>(&sql)
        .bind(user_id)
        .bind(filter.status)
        .bind(filter.customer_id)
        .bind(&filter.from)
        .bind(&filter.to)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Job::from).collect())
}

pub async fn find_by_id(pool: &SqlitePool, user_id: &str, id: i64) -> RepoResult<Option<Job>> {
    let sql = format!("{JOB_SELECT} WHERE user_id = ? AND id = ?");
    let row = sqlx::query_as::<_, JobRow>(&sql)
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Job::from))
}

/// A customer link must point at a customer the same user owns; foreign
/// ids read as nonexistent.
async fn check_customer_link(
    pool: &SqlitePool,
    user_id: &str,
    customer_id: Option<i64>,
) -> RepoResult<()> {
    if let Some(cid) = customer_id
        && customer::find_by_id(pool, user_id, cid).await?.is_none()
    {
        return Err(RepoError::NotFound(format!("Customer {cid} not found")));
    }
    Ok(())
}

pub async fn create(pool: &SqlitePool, user_id: &str, data: JobCreate) -> RepoResult<Job> {
    check_customer_link(pool, user_id, data.customer_id).await?;

    let now = now_millis();
    let id = snowflake_id();
    let revenue = money::round2(data.revenue);
    let expenses = money::round2(data.expenses.unwrap_or(0.0));
    let hourly_rate = money::rate(revenue, data.hours);
    let materials = serde_json::to_string(&data.materials.unwrap_or_default())
        .unwrap_or_else(|_| "[]".into());

    sqlx::query(
        "INSERT INTO jobs (id, user_id, customer_id, customer_name, job_type, revenue, expenses, hours, hourly_rate, status, date, satisfaction, materials, notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
    )
    .bind(id)
    .bind(user_id)
    .bind(data.customer_id)
    .bind(&data.customer_name)
    .bind(&data.job_type)
    .bind(revenue)
    .bind(expenses)
    .bind(data.hours)
    .bind(hourly_rate)
    .bind(data.status.unwrap_or_default())
    .bind(&data.date)
    .bind(data.satisfaction)
    .bind(&materials)
    .bind(&data.notes)
    .bind(now)
    .execute(pool)
    .await?;

    if let Some(cid) = data.customer_id {
        customer::recompute_stats(pool, cid).await?;
    }

    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create job".into()))
}

/// Read-merge-write: the final revenue/hours pair decides the stored
/// `hourly_rate`, so the merge happens here rather than in SQL.
pub async fn update(pool: &SqlitePool, user_id: &str, id: i64, data: JobUpdate) -> RepoResult<Job> {
    let old = find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Job {id} not found")))?;

    if data.customer_id != old.customer_id {
        check_customer_link(pool, user_id, data.customer_id).await?;
    }

    let now = now_millis();
    let customer_id = data.customer_id.or(old.customer_id);
    let customer_name = data.customer_name.unwrap_or(old.customer_name);
    let job_type = data.job_type.unwrap_or(old.job_type);
    let revenue = money::round2(data.revenue.unwrap_or(old.revenue));
    let expenses = money::round2(data.expenses.unwrap_or(old.expenses));
    let hours = data.hours.unwrap_or(old.hours);
    let hourly_rate = money::rate(revenue, hours);
    let status = data.status.unwrap_or(old.status);
    let date = data.date.unwrap_or(old.date);
    let satisfaction = data.satisfaction.or(old.satisfaction);
    let materials = match data.materials {
        Some(list) => serde_json::to_string(&list).unwrap_or_else(|_| "[]".into()),
        None => serde_json::to_string(&old.materials).unwrap_or_else(|_| "[]".into()),
    };
    let notes = data.notes.or(old.notes);

    sqlx::query(
        "UPDATE jobs SET customer_id = ?1, customer_name = ?2, job_type = ?3, revenue = ?4, expenses = ?5, hours = ?6, hourly_rate = ?7, status = ?8, date = ?9, satisfaction = ?10, materials = ?11, notes = ?12, updated_at = ?13 WHERE user_id = ?14 AND id = ?15",
    )
    .bind(customer_id)
    .bind(&customer_name)
    .bind(&job_type)
    .bind(revenue)
    .bind(expenses)
    .bind(hours)
    .bind(hourly_rate)
    .bind(status)
    .bind(&date)
    .bind(satisfaction)
    .bind(&materials)
    .bind(&notes)
    .bind(now)
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    // Both sides of a moved link need fresh aggregates
    if let Some(cid) = old.customer_id {
        customer::recompute_stats(pool, cid).await?;
    }
    if let Some(cid) = customer_id
        && Some(cid) != old.customer_id
    {
        customer::recompute_stats(pool, cid).await?;
    }

    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Job {id} not found")))
}

pub async fn delete(pool: &SqlitePool, user_id: &str, id: i64) -> RepoResult<bool> {
    let Some(old) = find_by_id(pool, user_id, id).await? else {
        return Ok(false);
    };

    sqlx::query("DELETE FROM jobs WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;

    if let Some(cid) = old.customer_id {
        customer::recompute_stats(pool, cid).await?;
    }
    Ok(true)
}

/// Jobs dated inside one calendar month (`period` is "YYYY-MM").
/// Quota checks count the business month, not the insertion time.
pub async fn count_in_month(pool: &SqlitePool, user_id: &str, period: &str) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM jobs WHERE user_id = ? AND substr(date, 1, 7) = ?",
    )
    .bind(user_id)
    .bind(period)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
