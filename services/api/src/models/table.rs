//! Billiard table models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TableStatus;

/// Table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub name: String,
    pub status: TableStatus,
    pub hourly_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for registering a new table
#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub name: String,
    pub hourly_rate: f64,
}

/// Request for changing a table's hourly rate
#[derive(Debug, Deserialize)]
pub struct UpdateRateRequest {
    pub hourly_rate: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TablesResponse {
    pub tables: Vec<Table>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TableRateResponse {
    pub message: String,
    pub table: Table,
}
