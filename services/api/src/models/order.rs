//! Session order models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// A product purchased during a session. Prices are snapshots taken at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOrder {
    pub id: i64,
    pub session_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_price: f64,
    pub note: Option<String>,
    pub status: OrderStatus,
    pub ordered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: i32,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request for adding one or more items to an active session
#[derive(Debug, Clone, Deserialize)]
pub struct AddOrderRequest {
    pub session_id: i64,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<SessionOrder>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
