//! Analytics Aggregator
//!
//! Five read-only reporting views, each scoped to one user and derived
//! entirely from the jobs and competitors tables:
//!
//! | View                  | Source rows          | Shape                    |
//! |-----------------------|----------------------|--------------------------|
//! | Dashboard metrics     | all jobs             | single totals record     |
//! | Efficiency matrix     | completed jobs       | per-job projection       |
//! | Customer value ranking| all jobs             | per-customer aggregates  |
//! | Seasonal trends       | last 12 months       | per-month aggregates     |
//! | Competitor comparison | completed + active   | per-competitor deltas    |
//!
//! Every division is zero-guarded so a user with no data gets zeroed or
//! empty results instead of an error. Nothing here writes; the
//! write-side mirror of the customer aggregation lives in
//! `db::repository::customer::recompute_stats`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::repository::RepoResult;
use crate::utils::money;

// ========== View Shapes ==========

/// Headline totals for the dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_profit: f64,
    pub total_hours: f64,
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub average_hourly_rate: f64,
    pub profit_margin: f64,
}

/// One completed job, projected for the hours-vs-revenue scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyEntry {
    pub customer_name: String,
    pub job_type: String,
    pub hours: f64,
    pub revenue: f64,
    pub hourly_rate: f64,
    pub date: String,
}

/// Per-customer lifetime aggregates with a rank-based value quartile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerValue {
    pub customer_name: String,
    pub total_jobs: i64,
    pub lifetime_revenue: f64,
    pub average_job_value: f64,
    pub last_job_date: String,
    /// 1 = top 25% of customers by lifetime revenue, 4 = bottom band.
    pub value_quartile: i64,
}

/// One calendar-month bucket of the trailing twelve months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalTrend {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: f64,
    pub hours: f64,
    pub job_count: i64,
    pub average_hourly_rate: f64,
}

/// The user's realized rate against one active competitor. Unstated
/// competitor rates read as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorComparison {
    pub competitor_name: String,
    pub competitor_rate: f64,
    pub emergency_rate: f64,
    pub user_average_rate: f64,
    /// `userAverageRate - competitorRate`; 0 when the competitor has no
    /// stated rate.
    pub price_difference: f64,
}

// ========== Dashboard Metrics ==========

/// Totals over every job the user owns, regardless of status.
pub async fn dashboard_metrics(pool: &SqlitePool, user_id: &str) -> RepoResult<DashboardMetrics> {
    let (revenue, expenses, hours, total_jobs, completed_jobs) =
        sqlx::query_as::<_, (f64, f64, f64, i64, i64)>(
            "SELECT COALESCE(SUM(revenue), 0.0), COALESCE(SUM(expenses), 0.0), COALESCE(SUM(hours), 0.0), COUNT(*), COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) FROM jobs WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let total_revenue = money::round2(revenue);
    let total_expenses = money::round2(expenses);
    let total_profit =
        money::to_f64(money::to_decimal(total_revenue) - money::to_decimal(total_expenses));

    Ok(DashboardMetrics {
        total_revenue,
        total_expenses,
        total_profit,
        total_hours: money::round2(hours),
        total_jobs,
        completed_jobs,
        average_hourly_rate: money::rate(total_revenue, hours),
        profit_margin: money::percentage(total_profit, total_revenue),
    })
}

// ========== Efficiency Matrix ==========

/// Completed jobs only, newest first. A direct projection, no grouping.
pub async fn efficiency_matrix(pool: &SqlitePool, user_id: &str) -> RepoResult<Vec<EfficiencyEntry>> {
    let rows = sqlx::query_as::<_, EfficiencyEntry>(
        "SELECT customer_name, job_type, hours, revenue, hourly_rate, date FROM jobs WHERE user_id = ?1 AND status = 'completed' ORDER BY date DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ========== Customer Value Ranking ==========

/// Percentile bucket for a 1-based rank: top 25% is quartile 1, then
/// each further 25% band, remainder quartile 4.
fn value_quartile(rank: usize, count: usize) -> i64 {
    if rank * 4 <= count {
        1
    } else if rank * 2 <= count {
        2
    } else if rank * 4 <= count * 3 {
        3
    } else {
        4
    }
}

/// Groups every job (any status) by customer name, richest first. Ties
/// fall back to name order so quartiles stay stable across calls.
pub async fn customer_value_ranking(
    pool: &SqlitePool,
    user_id: &str,
) -> RepoResult<Vec<CustomerValue>> {
    let rows = sqlx::query_as::<_, (String, i64, f64, f64, String)>(
        "SELECT customer_name, COUNT(*), COALESCE(SUM(revenue), 0.0) AS lifetime_revenue, ROUND(COALESCE(SUM(revenue), 0.0) * 1.0 / COUNT(*), 2), MAX(date) FROM jobs WHERE user_id = ?1 GROUP BY customer_name ORDER BY lifetime_revenue DESC, customer_name ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let count = rows.len();
    let ranking = rows
        .into_iter()
        .enumerate()
        .map(|(i, (customer_name, total_jobs, lifetime_revenue, average_job_value, last_job_date))| {
            CustomerValue {
                customer_name,
                total_jobs,
                lifetime_revenue: money::round2(lifetime_revenue),
                average_job_value,
                last_job_date,
                value_quartile: value_quartile(i + 1, count),
            }
        })
        .collect();
    Ok(ranking)
}

// ========== Seasonal Trends ==========

/// First day of the month eleven months before `today`, so the window
/// spans twelve calendar months including the current one.
fn trailing_year_start(today: NaiveDate) -> String {
    let months = today.year() * 12 + today.month0() as i32 - 11;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) + 1;
    format!("{year:04}-{month:02}-01")
}

/// Monthly revenue/hours/job-count buckets over the trailing twelve
/// months, oldest first. `today` is injected so tests can pin the window.
pub async fn seasonal_trends(
    pool: &SqlitePool,
    user_id: &str,
    today: NaiveDate,
) -> RepoResult<Vec<SeasonalTrend>> {
    let cutoff = trailing_year_start(today);
    let rows = sqlx::query_as::<_, (String, f64, f64, i64)>(
        "SELECT substr(date, 1, 7) AS month, COALESCE(SUM(revenue), 0.0), COALESCE(SUM(hours), 0.0), COUNT(*) FROM jobs WHERE user_id = ?1 AND date >= ?2 GROUP BY month ORDER BY month ASC",
    )
    .bind(user_id)
    .bind(&cutoff)
    .fetch_all(pool)
    .await?;

    let trends = rows
        .into_iter()
        .map(|(month, revenue, hours, job_count)| SeasonalTrend {
            month,
            revenue: money::round2(revenue),
            hours: money::round2(hours),
            job_count,
            average_hourly_rate: money::rate(revenue, hours),
        })
        .collect();
    Ok(trends)
}

// ========== Competitor Comparison ==========

/// The user's realized hourly rate (completed work only) against each
/// active competitor's stated rates.
pub async fn competitor_comparison(
    pool: &SqlitePool,
    user_id: &str,
) -> RepoResult<Vec<CompetitorComparison>> {
    let (revenue, hours) = sqlx::query_as::<_, (f64, f64)>(
        "SELECT COALESCE(SUM(revenue), 0.0), COALESCE(SUM(hours), 0.0) FROM jobs WHERE user_id = ?1 AND status = 'completed'",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    let user_average_rate = money::rate(revenue, hours);

    let competitors = sqlx::query_as::<_, (String, Option<f64>, Option<f64>)>(
        "SELECT name, hourly_rate, emergency_rate FROM competitors WHERE user_id = ?1 AND is_active = 1 ORDER BY name ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let comparison = competitors
        .into_iter()
        .map(|(competitor_name, competitor_rate, emergency_rate)| {
            let price_difference = match competitor_rate {
                Some(rate) => {
                    money::to_f64(money::to_decimal(user_average_rate) - money::to_decimal(rate))
                }
                None => 0.0,
            };
            CompetitorComparison {
                competitor_name,
                competitor_rate: competitor_rate.unwrap_or_default(),
                emergency_rate: emergency_rate.unwrap_or_default(),
                user_average_rate,
                price_difference,
            }
        })
        .collect();
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;
    use crate::db::repository::{competitor, job};
    use shared::models::{CompetitorCreate, CompetitorUpdate, JobCreate, JobStatus};

    fn job_input(name: &str, revenue: f64, hours: f64, status: JobStatus, date: &str) -> JobCreate {
        JobCreate {
            customer_id: None,
            customer_name: name.into(),
            job_type: "Callout".into(),
            revenue,
            expenses: None,
            hours,
            hourly_rate: None,
            status: Some(status),
            date: date.into(),
            satisfaction: None,
            materials: None,
            notes: None,
        }
    }

    async fn seed_job(pool: &SqlitePool, user: &str, input: JobCreate) {
        job::create(pool, user, input).await.unwrap();
    }

    fn competitor_input(name: &str, rate: Option<f64>, emergency: Option<f64>) -> CompetitorCreate {
        CompetitorCreate {
            name: name.into(),
            hourly_rate: rate,
            emergency_rate: emergency,
            services: None,
            rating: None,
            review_count: None,
            location: None,
            notes: None,
        }
    }

    /// Revenue/hours (100, 2), (300, 4), (200, 2), all completed.
    async fn seed_example_jobs(pool: &SqlitePool, user: &str) {
        seed_job(pool, user, job_input("A", 100.0, 2.0, JobStatus::Completed, "2025-03-01")).await;
        seed_job(pool, user, job_input("B", 300.0, 4.0, JobStatus::Completed, "2025-03-02")).await;
        seed_job(pool, user, job_input("C", 200.0, 2.0, JobStatus::Completed, "2025-03-03")).await;
    }

    #[tokio::test]
    async fn test_dashboard_example_totals() {
        let pool = test_pool().await;
        seed_example_jobs(&pool, "u1").await;

        let metrics = dashboard_metrics(&pool, "u1").await.unwrap();
        assert_eq!(metrics.total_revenue, 600.0);
        assert_eq!(metrics.total_hours, 8.0);
        assert_eq!(metrics.average_hourly_rate, 75.0);
        assert_eq!(metrics.total_jobs, 3);
        assert_eq!(metrics.completed_jobs, 3);
        // No expenses recorded, so profit is the full revenue
        assert_eq!(metrics.total_profit, 600.0);
        assert_eq!(metrics.profit_margin, 100.0);
    }

    #[tokio::test]
    async fn test_dashboard_counts_every_status() {
        let pool = test_pool().await;
        let mut quote = job_input("A", 150.0, 3.0, JobStatus::Quoted, "2025-03-05");
        quote.expenses = Some(50.0);
        seed_job(&pool, "u1", quote).await;
        seed_job(&pool, "u1", job_input("B", 100.0, 2.0, JobStatus::Completed, "2025-03-06")).await;

        let metrics = dashboard_metrics(&pool, "u1").await.unwrap();
        assert_eq!(metrics.total_jobs, 2);
        assert_eq!(metrics.completed_jobs, 1);
        assert_eq!(metrics.total_revenue, 250.0);
        assert_eq!(metrics.total_expenses, 50.0);
        assert_eq!(metrics.total_profit, 200.0);
        assert_eq!(metrics.profit_margin, 80.0);
    }

    #[tokio::test]
    async fn test_dashboard_empty_user_is_zeroed() {
        let pool = test_pool().await;
        let metrics = dashboard_metrics(&pool, "nobody").await.unwrap();
        assert_eq!(metrics.total_jobs, 0);
        assert_eq!(metrics.total_revenue, 0.0);
        assert_eq!(metrics.average_hourly_rate, 0.0);
        assert_eq!(metrics.profit_margin, 0.0);
    }

    #[tokio::test]
    async fn test_efficiency_matrix_completed_only_newest_first() {
        let pool = test_pool().await;
        seed_example_jobs(&pool, "u1").await;
        seed_job(&pool, "u1", job_input("D", 999.0, 1.0, JobStatus::Quoted, "2025-03-04")).await;

        let matrix = efficiency_matrix(&pool, "u1").await.unwrap();
        assert_eq!(matrix.len(), 3);
        let rates: Vec<f64> = matrix.iter().map(|e| e.hourly_rate).collect();
        assert_eq!(rates, vec![100.0, 75.0, 50.0]);
        assert_eq!(matrix[0].date, "2025-03-03");
        assert_eq!(matrix[0].job_type, "Callout");
    }

    #[tokio::test]
    async fn test_quartile_thresholds() {
        // Exact quarters
        assert_eq!(
            (1..=4).map(|r| value_quartile(r, 4)).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            (1..=8).map(|r| value_quartile(r, 8)).collect::<Vec<_>>(),
            vec![1, 1, 2, 2, 3, 3, 4, 4]
        );
        // Uneven population rounds each rank up to the band it falls in
        assert_eq!(
            (1..=5).map(|r| value_quartile(r, 5)).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 4]
        );
        // A lone customer sits at the 100th percentile
        assert_eq!(value_quartile(1, 1), 4);
    }

    #[tokio::test]
    async fn test_customer_ranking_order_and_quartiles() {
        let pool = test_pool().await;
        for (name, revenue) in [
            ("Heights", 800.0),
            ("Gables", 700.0),
            ("Ferns", 600.0),
            ("Elms", 500.0),
            ("Dunes", 400.0),
            ("Cedars", 300.0),
            ("Birches", 200.0),
            ("Acres", 100.0),
        ] {
            seed_job(&pool, "u1", job_input(name, revenue, 2.0, JobStatus::Completed, "2025-01-10"))
                .await;
        }

        let ranking = customer_value_ranking(&pool, "u1").await.unwrap();
        assert_eq!(ranking.len(), 8);
        assert_eq!(ranking[0].customer_name, "Heights");
        assert_eq!(ranking[0].lifetime_revenue, 800.0);
        assert_eq!(ranking[0].average_job_value, 800.0);
        assert_eq!(ranking[0].total_jobs, 1);
        assert_eq!(ranking[0].last_job_date, "2025-01-10");
        let quartiles: Vec<i64> = ranking.iter().map(|c| c.value_quartile).collect();
        assert_eq!(quartiles, vec![1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[tokio::test]
    async fn test_customer_ranking_groups_and_breaks_ties_by_name() {
        let pool = test_pool().await;
        // Two jobs for the same customer group into one row
        seed_job(&pool, "u1", job_input("Mrs Hughes", 100.0, 2.0, JobStatus::Completed, "2025-01-05")).await;
        seed_job(&pool, "u1", job_input("Mrs Hughes", 200.0, 2.0, JobStatus::Quoted, "2025-02-05")).await;
        // Two customers tied on revenue order by name
        seed_job(&pool, "u1", job_input("Zed Ltd", 300.0, 2.0, JobStatus::Completed, "2025-01-06")).await;
        seed_job(&pool, "u1", job_input("Ace Ltd", 300.0, 2.0, JobStatus::Completed, "2025-01-07")).await;

        let ranking = customer_value_ranking(&pool, "u1").await.unwrap();
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking[0].customer_name, "Ace Ltd");
        assert_eq!(ranking[1].customer_name, "Zed Ltd");
        assert_eq!(ranking[2].customer_name, "Mrs Hughes");
        assert_eq!(ranking[2].total_jobs, 2);
        assert_eq!(ranking[2].lifetime_revenue, 300.0);
        assert_eq!(ranking[2].average_job_value, 150.0);
        assert_eq!(ranking[2].last_job_date, "2025-02-05");
    }

    #[tokio::test]
    async fn test_seasonal_window_and_buckets() {
        let pool = test_pool().await;
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(trailing_year_start(today), "2024-07-01");

        // Just inside and just outside the window
        seed_job(&pool, "u1", job_input("A", 100.0, 2.0, JobStatus::Completed, "2024-07-01")).await;
        seed_job(&pool, "u1", job_input("B", 999.0, 9.0, JobStatus::Completed, "2024-06-30")).await;
        // Two jobs sharing a month bucket
        seed_job(&pool, "u1", job_input("C", 100.0, 1.0, JobStatus::Quoted, "2025-03-10")).await;
        seed_job(&pool, "u1", job_input("D", 200.0, 2.0, JobStatus::Completed, "2025-03-20")).await;

        let trends = seasonal_trends(&pool, "u1", today).await.unwrap();
        let months: Vec<&str> = trends.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(months, vec!["2024-07", "2025-03"]);
        assert_eq!(trends[1].revenue, 300.0);
        assert_eq!(trends[1].hours, 3.0);
        assert_eq!(trends[1].job_count, 2);
        assert_eq!(trends[1].average_hourly_rate, 100.0);
    }

    #[tokio::test]
    async fn test_trailing_year_start_crosses_january() {
        let jan = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(trailing_year_start(jan), "2024-02-01");
        let dec = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(trailing_year_start(dec), "2024-01-01");
    }

    #[tokio::test]
    async fn test_competitor_comparison_rates_and_guards() {
        let pool = test_pool().await;
        // 600 over 8 completed hours = 75/h; the quoted job must not count
        seed_example_jobs(&pool, "u1").await;
        seed_job(&pool, "u1", job_input("X", 1000.0, 1.0, JobStatus::Quoted, "2025-03-09")).await;

        competitor::create(&pool, "u1", competitor_input("Acme Plumbing", Some(60.0), Some(90.0)))
            .await
            .unwrap();
        competitor::create(&pool, "u1", competitor_input("Budget Gas", None, None))
            .await
            .unwrap();
        let gone = competitor::create(&pool, "u1", competitor_input("Closed Down", Some(40.0), None))
            .await
            .unwrap();
        competitor::update(
            &pool,
            "u1",
            gone.id,
            CompetitorUpdate { is_active: Some(false), ..Default::default() },
        )
        .await
        .unwrap();

        let comparison = competitor_comparison(&pool, "u1").await.unwrap();
        assert_eq!(comparison.len(), 2);
        assert_eq!(comparison[0].competitor_name, "Acme Plumbing");
        assert_eq!(comparison[0].user_average_rate, 75.0);
        assert_eq!(comparison[0].price_difference, 15.0);
        assert_eq!(comparison[0].emergency_rate, 90.0);
        // No stated rate: reads as 0 and the difference is pinned to 0
        assert_eq!(comparison[1].competitor_name, "Budget Gas");
        assert_eq!(comparison[1].competitor_rate, 0.0);
        assert_eq!(comparison[1].price_difference, 0.0);
    }

    #[tokio::test]
    async fn test_views_are_idempotent() {
        let pool = test_pool().await;
        seed_example_jobs(&pool, "u1").await;
        competitor::create(&pool, "u1", competitor_input("Acme Plumbing", Some(60.0), None))
            .await
            .unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        assert_eq!(
            dashboard_metrics(&pool, "u1").await.unwrap(),
            dashboard_metrics(&pool, "u1").await.unwrap()
        );
        assert_eq!(
            efficiency_matrix(&pool, "u1").await.unwrap(),
            efficiency_matrix(&pool, "u1").await.unwrap()
        );
        assert_eq!(
            customer_value_ranking(&pool, "u1").await.unwrap(),
            customer_value_ranking(&pool, "u1").await.unwrap()
        );
        assert_eq!(
            seasonal_trends(&pool, "u1", today).await.unwrap(),
            seasonal_trends(&pool, "u1", today).await.unwrap()
        );
        assert_eq!(
            competitor_comparison(&pool, "u1").await.unwrap(),
            competitor_comparison(&pool, "u1").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_views_are_user_scoped() {
        let pool = test_pool().await;
        seed_example_jobs(&pool, "u1").await;
        competitor::create(&pool, "u1", competitor_input("Acme Plumbing", Some(60.0), None))
            .await
            .unwrap();

        let metrics = dashboard_metrics(&pool, "u2").await.unwrap();
        assert_eq!(metrics.total_jobs, 0);
        assert!(efficiency_matrix(&pool, "u2").await.unwrap().is_empty());
        assert!(customer_value_ranking(&pool, "u2").await.unwrap().is_empty());
        assert!(competitor_comparison(&pool, "u2").await.unwrap().is_empty());
    }
}
