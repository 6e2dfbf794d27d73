//! Dashboard aggregate queries

use chrono::{DateTime, FixedOffset, Utc};
use sqlx::{PgPool, Row};

use crate::{
    error::ApiResult,
    models::{Activity, DashboardStats, SessionStatus},
    period,
};

const ACTIVITY_LIMIT: i64 = 10;

/// Dashboard repository
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    /// Create a new dashboard repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Figures for the business day `[day_start, day_end)`
    pub async fn stats(
        &self,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> ApiResult<DashboardStats> {
        let invoices = sqlx::query(
            r#"
            SELECT COUNT(*) AS today_invoices,
                   COALESCE(SUM(amount), 0)::DOUBLE PRECISION AS today_revenue
            FROM invoices
            WHERE created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&self.pool)
        .await?;

        let active_sessions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM table_sessions WHERE status = $1")
                .bind(SessionStatus::Active.as_str())
                .fetch_one(&self.pool)
                .await?;

        let avg_minutes: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT AVG(COALESCE(
                       actual_duration_minutes,
                       preset_duration_minutes - COALESCE(remaining_minutes, 0)
                   ))::DOUBLE PRECISION
            FROM table_sessions
            WHERE start_time >= $1 AND start_time < $2
              AND status IN ($3, $4)
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .bind(SessionStatus::Completed.as_str())
        .bind(SessionStatus::Expired.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            today_revenue: invoices.get("today_revenue"),
            active_sessions,
            today_invoices: invoices.get("today_invoices"),
            avg_session_time: avg_minutes.unwrap_or(0.0) / 60.0,
        })
    }

    /// Sessions started during the business day, newest first
    pub async fn activities(
        &self,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
        offset: FixedOffset,
    ) -> ApiResult<Vec<Activity>> {
        let rows = sqlx::query(
            r#"
            SELECT s.status, t.name AS table_name, s.customer_name, s.start_time
            FROM table_sessions s
            JOIN tables t ON t.id = s.table_id
            WHERE s.start_time >= $1 AND s.start_time < $2
            ORDER BY s.start_time DESC, s.id DESC
            LIMIT $3
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .bind(ACTIVITY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> ApiResult<Activity> {
                let status: SessionStatus = row.get::<String, _>("status").parse()?;
                Ok(Activity {
                    action: activity_label(status).to_string(),
                    table: row.get("table_name"),
                    customer: row.get("customer_name"),
                    time: period::clock_time(row.get("start_time"), offset),
                })
            })
            .collect()
    }
}

fn activity_label(status: SessionStatus) -> &'static str {
    if status.is_terminal() {
        "Session ended"
    } else {
        "Session started"
    }
}
