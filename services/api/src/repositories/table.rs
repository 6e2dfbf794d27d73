//! Table registry

use sqlx::{PgExecutor, PgPool, Row, postgres::PgRow};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateTableRequest, Table, TableStatus},
};

use super::conflict_on_unique;

/// Table repository
#[derive(Clone)]
pub struct TableRepository {
    pool: PgPool,
}

impl TableRepository {
    /// Create a new table repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All tables ordered by name
    pub async fn list(&self) -> ApiResult<Vec<Table>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, status, hourly_rate, created_at, updated_at
            FROM tables
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(table_from_row).collect()
    }

    pub async fn find_by_id(&self, id: i64) -> ApiResult<Option<Table>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, status, hourly_rate, created_at, updated_at
            FROM tables
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(table_from_row).transpose()
    }

    /// Register a new table; it starts out available
    pub async fn create(&self, req: &CreateTableRequest) -> ApiResult<Table> {
        let name = req.name.trim();
        let row = sqlx::query(
            r#"
            INSERT INTO tables (name, status, hourly_rate)
            VALUES ($1, $2, $3)
            RETURNING id, name, status, hourly_rate, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(TableStatus::Available.as_str())
        .bind(req.hourly_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("table {} already exists", name)))?;

        let table = table_from_row(&row)?;
        info!("Created table {} ({})", table.name, table.id);
        Ok(table)
    }

    /// Change the hourly rate. Running sessions keep the rate they snapshotted.
    pub async fn update_rate(&self, id: i64, hourly_rate: f64) -> ApiResult<Table> {
        let row = sqlx::query(
            r#"
            UPDATE tables
            SET hourly_rate = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, status, hourly_rate, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(hourly_rate)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Table not found".to_string()))?;

        let table = table_from_row(&row)?;
        info!("Table {} rate set to {}", table.id, table.hourly_rate);
        Ok(table)
    }
}

/// Set one table's status. Meant to run on a lifecycle transaction.
pub(crate) async fn set_status<'e, E>(executor: E, id: i64, status: TableStatus) -> ApiResult<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("UPDATE tables SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Table not found".to_string()));
    }
    Ok(())
}

/// Set the status of exactly the given tables, returning how many changed
pub(crate) async fn set_status_many<'e, E>(
    executor: E,
    ids: &[i64],
    status: TableStatus,
) -> ApiResult<u64>
where
    E: PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(0);
    }

    let result =
        sqlx::query("UPDATE tables SET status = $2, updated_at = NOW() WHERE id = ANY($1)")
            .bind(ids)
            .bind(status.as_str())
            .execute(executor)
            .await?;

    Ok(result.rows_affected())
}

fn table_from_row(row: &PgRow) -> ApiResult<Table> {
    Ok(Table {
        id: row.get("id"),
        name: row.get("name"),
        status: row.get::<String, _>("status").parse()?,
        hourly_rate: row.get("hourly_rate"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
