//! Invoice repository

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{Invoice, InvoiceStatus, NewInvoice, ReportTotals},
};

use super::conflict_on_unique;

const SELECT_INVOICE: &str = r#"
    SELECT id, session_id, customer_name, table_name, start_time, end_time,
           play_duration_minutes, hourly_rate, table_amount, orders_amount, discount,
           amount, services_detail, status, created_by, created_at, updated_at
    FROM invoices
"#;

/// Invoice repository
#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    /// Create a new invoice repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending invoice and return it as stored
    pub async fn create(&self, invoice: &NewInvoice) -> ApiResult<Invoice> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoices (
                session_id, customer_name, table_name, start_time, end_time,
                play_duration_minutes, hourly_rate, table_amount, orders_amount,
                discount, amount, services_detail, status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(invoice.session_id)
        .bind(invoice.customer_name.as_deref())
        .bind(&invoice.table_name)
        .bind(invoice.start_time)
        .bind(invoice.end_time)
        .bind(invoice.play_duration_minutes)
        .bind(invoice.hourly_rate)
        .bind(invoice.table_amount)
        .bind(invoice.orders_amount)
        .bind(invoice.discount)
        .bind(invoice.amount)
        .bind(&invoice.services_detail)
        .bind(InvoiceStatus::Pending.as_str())
        .bind(invoice.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Session already has an invoice"))?;

        info!(
            "Created invoice {} for {} (amount {})",
            id, invoice.table_name, invoice.amount
        );

        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::Internal(format!("invoice {} vanished after insert", id)))
    }

    pub async fn find_by_id(&self, id: i64) -> ApiResult<Option<Invoice>> {
        let sql = format!("{} WHERE id = $1", SELECT_INVOICE);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(invoice_from_row).transpose()
    }

    /// Newest first
    pub async fn list(&self, limit: i64, offset: i64) -> ApiResult<Vec<Invoice>> {
        let sql = format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            SELECT_INVOICE
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(invoice_from_row).collect()
    }

    /// Change only the status; money fields are frozen
    pub async fn update_status(&self, id: i64, status: InvoiceStatus) -> ApiResult<Invoice> {
        let result =
            sqlx::query("UPDATE invoices SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Invoice not found".to_string()));
        }
        info!("Invoice {} is now {}", id, status);

        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))
    }

    /// Count and sums over invoices created in `[start, end)`
    pub async fn totals_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<ReportTotals> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_invoices,
                   COALESCE(SUM(amount), 0)::DOUBLE PRECISION AS total_revenue,
                   COALESCE(SUM(table_amount), 0)::DOUBLE PRECISION AS total_time_revenue,
                   COALESCE(SUM(orders_amount), 0)::DOUBLE PRECISION AS total_service_revenue
            FROM invoices
            WHERE created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(ReportTotals {
            total_invoices: row.get("total_invoices"),
            total_revenue: row.get("total_revenue"),
            total_time_revenue: row.get("total_time_revenue"),
            total_service_revenue: row.get("total_service_revenue"),
        })
    }
}

fn invoice_from_row(row: &PgRow) -> ApiResult<Invoice> {
    Ok(Invoice {
        id: row.get("id"),
        session_id: row.get("session_id"),
        customer_name: row.get("customer_name"),
        table_name: row.get("table_name"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        play_duration_minutes: row.get("play_duration_minutes"),
        hourly_rate: row.get("hourly_rate"),
        table_amount: row.get("table_amount"),
        orders_amount: row.get("orders_amount"),
        discount: row.get("discount"),
        amount: row.get("amount"),
        services_detail: row.get("services_detail"),
        status: row.get::<String, _>("status").parse()?,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
