//! Session lifecycle persistence

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, warn};

use crate::{
    billing,
    error::{ApiError, ApiResult},
    models::{SessionStatus, StartSessionRequest, TableSession, TableStatus},
};

use super::{minutes_column, table};

const SELECT_SESSION: &str = r#"
    SELECT s.id, s.table_id, t.name AS table_name, s.customer_name, s.start_time, s.end_time,
           s.preset_duration_minutes, s.remaining_minutes, s.actual_duration_minutes,
           s.hourly_rate, s.prepaid_amount, s.status, s.session_type, s.created_by,
           s.created_at, s.updated_at
    FROM table_sessions s
    JOIN tables t ON t.id = s.table_id
"#;

/// A session moved to expired by [`SessionRepository::expire_due`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpiredSession {
    pub session_id: i64,
    pub table_id: i64,
    pub created_by: i64,
}

/// Session repository
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> ApiResult<Option<TableSession>> {
        let sql = format!("{} WHERE s.id = $1", SELECT_SESSION);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    /// Like [`find_by_id`](Self::find_by_id) but absence is an error
    pub async fn get(&self, id: i64) -> ApiResult<TableSession> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
    }

    /// Active sessions, oldest first
    pub async fn list_active(&self) -> ApiResult<Vec<TableSession>> {
        let sql = format!(
            "{} WHERE s.status = $1 ORDER BY s.start_time ASC, s.id ASC",
            SELECT_SESSION
        );
        let rows = sqlx::query(&sql)
            .bind(SessionStatus::Active.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(session_from_row).collect()
    }

    /// Open a session on an available table and mark the table occupied.
    ///
    /// The table row stays locked until commit, so two concurrent starts on
    /// one table cannot both pass the availability check.
    pub async fn start(
        &self,
        req: &StartSessionRequest,
        actor_id: i64,
        now: DateTime<Utc>,
    ) -> ApiResult<TableSession> {
        let mut tx = self.pool.begin().await?;

        let table_row = sqlx::query("SELECT status, hourly_rate FROM tables WHERE id = $1 FOR UPDATE")
            .bind(req.table_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Table not found".to_string()))?;

        let status: TableStatus = table_row.get::<String, _>("status").parse()?;
        if status != TableStatus::Available {
            warn!("Refusing to start session on table {} ({})", req.table_id, status);
            return Err(ApiError::Conflict("Table is not available".to_string()));
        }
        let hourly_rate: f64 = table_row.get("hourly_rate");

        let session_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO table_sessions (
                table_id, customer_name, start_time, preset_duration_minutes,
                remaining_minutes, hourly_rate, prepaid_amount, status, session_type, created_by
            )
            VALUES ($1, $2, $3, $4, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(req.table_id)
        .bind(req.customer_name.trim())
        .bind(now)
        .bind(req.preset_duration_minutes)
        .bind(hourly_rate)
        .bind(req.prepaid_amount)
        .bind(SessionStatus::Active.as_str())
        .bind(req.session_type.as_str())
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await?;

        table::set_status(&mut *tx, req.table_id, TableStatus::Occupied).await?;

        tx.commit().await?;

        info!(
            "Started {} session {} on table {} at rate {}",
            req.session_type, session_id, req.table_id, hourly_rate
        );

        self.find_by_id(session_id)
            .await?
            .ok_or_else(|| ApiError::Internal(format!("session {} vanished after insert", session_id)))
    }

    /// Complete a session and free its table in one transaction
    pub async fn end(&self, id: i64, now: DateTime<Utc>) -> ApiResult<TableSession> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT table_id, status, start_time FROM table_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

        let status: SessionStatus = row.get::<String, _>("status").parse()?;
        if status.is_terminal() {
            warn!("Session {} is already {}", id, status);
            return Err(ApiError::Conflict(format!("Session is already {}", status)));
        }

        let table_id: i64 = row.get("table_id");
        let start_time: DateTime<Utc> = row.get("start_time");
        let actual_minutes = minutes_column(billing::elapsed_minutes(start_time, now));

        sqlx::query(
            r#"
            UPDATE table_sessions
            SET status = $2, end_time = $3, actual_duration_minutes = $4, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(SessionStatus::Completed.as_str())
        .bind(now)
        .bind(actual_minutes)
        .execute(&mut *tx)
        .await?;

        table::set_status(&mut *tx, table_id, TableStatus::Available).await?;

        tx.commit().await?;

        info!(
            "Ended session {} on table {} after {} minutes",
            id, table_id, actual_minutes
        );

        self.get(id).await
    }

    /// Expire every active session that has run out of time and free exactly
    /// their tables. Rows that no longer match are untouched, so repeated or
    /// concurrent runs converge.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> ApiResult<Vec<ExpiredSession>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            UPDATE table_sessions
            SET status = $2,
                end_time = $1,
                actual_duration_minutes =
                    GREATEST(0, FLOOR(EXTRACT(EPOCH FROM ($1 - start_time)) / 60)::INTEGER),
                updated_at = $1
            WHERE status = $3 AND remaining_minutes <= 0
            RETURNING id, table_id, created_by
            "#,
        )
        .bind(now)
        .bind(SessionStatus::Expired.as_str())
        .bind(SessionStatus::Active.as_str())
        .fetch_all(&mut *tx)
        .await?;

        let expired: Vec<ExpiredSession> = rows
            .iter()
            .map(|row| ExpiredSession {
                session_id: row.get("id"),
                table_id: row.get("table_id"),
                created_by: row.get("created_by"),
            })
            .collect();

        let table_ids: Vec<i64> = expired.iter().map(|s| s.table_id).collect();
        table::set_status_many(&mut *tx, &table_ids, TableStatus::Available).await?;

        tx.commit().await?;

        if !expired.is_empty() {
            info!("Expired {} sessions", expired.len());
        }
        Ok(expired)
    }

    /// Overwrite the remaining minutes. Negative values mean the session is overdue.
    pub async fn update_remaining_time(&self, id: i64, minutes: i32) -> ApiResult<TableSession> {
        let result = sqlx::query(
            "UPDATE table_sessions SET remaining_minutes = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(minutes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Session not found".to_string()));
        }
        self.get(id).await
    }

    /// Extend a session: both the preset and the remaining time grow by `delta`
    pub async fn add_minutes(&self, id: i64, delta: i32) -> ApiResult<TableSession> {
        let result = sqlx::query(
            r#"
            UPDATE table_sessions
            SET preset_duration_minutes = preset_duration_minutes + $2,
                -- also pushes back auto-expiry
                remaining_minutes = COALESCE(remaining_minutes, 0) + $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(delta)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Session not found".to_string()));
        }
        info!("Extended session {} by {} minutes", id, delta);
        self.get(id).await
    }

    pub async fn update_preset_duration(&self, id: i64, minutes: i32) -> ApiResult<TableSession> {
        let result = sqlx::query(
            "UPDATE table_sessions SET preset_duration_minutes = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(minutes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Session not found".to_string()));
        }
        self.get(id).await
    }
}

fn session_from_row(row: &PgRow) -> ApiResult<TableSession> {
    Ok(TableSession {
        id: row.get("id"),
        table_id: row.get("table_id"),
        table_name: row.get("table_name"),
        customer_name: row.get("customer_name"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        preset_duration_minutes: row.get("preset_duration_minutes"),
        remaining_minutes: row.get("remaining_minutes"),
        actual_duration_minutes: row.get("actual_duration_minutes"),
        hourly_rate: row.get("hourly_rate"),
        prepaid_amount: row.get("prepaid_amount"),
        status: row.get::<String, _>("status").parse()?,
        session_type: row.get::<String, _>("session_type").parse()?,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
