//! Order ledger

use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    models::{AddOrderRequest, OrderStatus, SessionOrder, SessionStatus},
};

const SELECT_ORDER: &str = r#"
    SELECT o.id, o.session_id, o.product_id, p.name AS product_name, o.quantity,
           o.unit_price, o.total_price, o.note, o.status, o.ordered_at
    FROM session_orders o
    JOIN products p ON p.id = o.product_id
"#;

/// Order repository
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record every item of the request or none of them.
    ///
    /// Prices are snapshotted from the catalog. The session row is locked so
    /// it cannot end while the items are being written.
    pub async fn add_items(&self, req: &AddOrderRequest) -> ApiResult<Vec<SessionOrder>> {
        let mut tx = self.pool.begin().await?;

        let status: String =
            sqlx::query_scalar("SELECT status FROM table_sessions WHERE id = $1 FOR UPDATE")
                .bind(req.session_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

        let status: SessionStatus = status.parse()?;
        if status != SessionStatus::Active {
            warn!("Refusing order on session {} ({})", req.session_id, status);
            return Err(ApiError::Conflict("Session is not active".to_string()));
        }

        let mut orders = Vec::with_capacity(req.items.len());
        for item in &req.items {
            let product = sqlx::query("SELECT name, price, is_active FROM products WHERE id = $1")
                .bind(item.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .filter(|row| row.get::<bool, _>("is_active"))
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            let product_name: String = product.get("name");
            let unit_price: f64 = product.get("price");
            let total_price = unit_price * f64::from(item.quantity);
            let note = item
                .note
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty());

            let row = sqlx::query(
                r#"
                INSERT INTO session_orders
                    (session_id, product_id, quantity, unit_price, total_price, note, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, ordered_at
                "#,
            )
            .bind(req.session_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(unit_price)
            .bind(total_price)
            .bind(note)
            .bind(OrderStatus::Pending.as_str())
            .fetch_one(&mut *tx)
            .await?;

            orders.push(SessionOrder {
                id: row.get("id"),
                session_id: req.session_id,
                product_id: item.product_id,
                product_name,
                quantity: item.quantity,
                unit_price,
                total_price,
                note: note.map(str::to_string),
                status: OrderStatus::Pending,
                ordered_at: row.get("ordered_at"),
            });
        }

        tx.commit().await?;

        info!(
            "Added {} order lines to session {}",
            orders.len(),
            req.session_id
        );
        Ok(orders)
    }

    pub async fn find_by_id(&self, id: i64) -> ApiResult<Option<SessionOrder>> {
        let sql = format!("{} WHERE o.id = $1", SELECT_ORDER);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    /// All orders of a session in any status, most recent first
    pub async fn list_for_session(&self, session_id: i64) -> ApiResult<Vec<SessionOrder>> {
        let sql = format!(
            "{} WHERE o.session_id = $1 ORDER BY o.ordered_at DESC, o.id DESC",
            SELECT_ORDER
        );
        let rows = sqlx::query(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(order_from_row).collect()
    }

    /// Billable orders in the order they were placed
    pub async fn service_lines(&self, session_id: i64) -> ApiResult<Vec<SessionOrder>> {
        let sql = format!(
            "{} WHERE o.session_id = $1 AND o.status <> $2 ORDER BY o.ordered_at ASC, o.id ASC",
            SELECT_ORDER
        );
        let rows = sqlx::query(&sql)
            .bind(session_id)
            .bind(OrderStatus::Cancelled.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(order_from_row).collect()
    }

    /// Sum of line totals, excluding cancelled orders
    pub async fn total_for_session(&self, session_id: i64) -> ApiResult<f64> {
        let total: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_price), 0)::DOUBLE PRECISION
            FROM session_orders
            WHERE session_id = $1 AND status <> $2
            "#,
        )
        .bind(session_id)
        .bind(OrderStatus::Cancelled.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Move an order along its workflow. Cancelled orders stay cancelled.
    pub async fn update_status(&self, id: i64, status: OrderStatus) -> ApiResult<SessionOrder> {
        let mut tx = self.pool.begin().await?;

        let current: String =
            sqlx::query_scalar("SELECT status FROM session_orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

        if current.parse::<OrderStatus>()? == OrderStatus::Cancelled {
            return Err(ApiError::Conflict("Order is already cancelled".to_string()));
        }

        sqlx::query("UPDATE session_orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Order {} is now {}", id, status);

        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))
    }
}

fn order_from_row(row: &PgRow) -> ApiResult<SessionOrder> {
    Ok(SessionOrder {
        id: row.get("id"),
        session_id: row.get("session_id"),
        product_id: row.get("product_id"),
        product_name: row.get("product_name"),
        quantity: row.get("quantity"),
        unit_price: row.get("unit_price"),
        total_price: row.get("total_price"),
        note: row.get("note"),
        status: row.get::<String, _>("status").parse()?,
        ordered_at: row.get("ordered_at"),
    })
}
