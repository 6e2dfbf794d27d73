//! Product catalog repository

use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateProductRequest, Product, UpdateProductRequest},
};

use super::conflict_on_unique;

/// Product repository
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active products grouped by category, then by name
    pub async fn list_active(&self) -> ApiResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category, price, description, is_active, created_at, updated_at
            FROM products
            WHERE is_active = TRUE
            ORDER BY category, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    pub async fn create(&self, req: &CreateProductRequest) -> ApiResult<Product> {
        let name = req.name.trim();
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, category, price, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, category, price, description, is_active, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(req.category.as_str())
        .bind(req.price)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Product {} already exists", name)))?;

        let product = product_from_row(&row)?;
        info!("Created product {} ({})", product.name, product.id);
        Ok(product)
    }

    /// Apply a partial update; absent fields are left as they are
    pub async fn update(&self, id: i64, req: &UpdateProductRequest) -> ApiResult<Product> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                price = COALESCE($4, price),
                description = COALESCE($5, description),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, category, price, description, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.category.map(|c| c.as_str()))
        .bind(req.price)
        .bind(req.description.as_deref())
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Product name already exists"))?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

        product_from_row(&row)
    }

    /// Soft delete: the product disappears from the catalog but past orders keep it
    pub async fn deactivate(&self, id: i64) -> ApiResult<()> {
        let result =
            sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Product not found".to_string()));
        }
        info!("Deactivated product {}", id);
        Ok(())
    }
}

fn product_from_row(row: &PgRow) -> ApiResult<Product> {
    Ok(Product {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get::<String, _>("category").parse()?,
        price: row.get("price"),
        description: row.get("description"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
