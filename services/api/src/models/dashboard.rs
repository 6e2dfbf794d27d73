//! Dashboard models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub today_revenue: f64,
    pub active_sessions: i64,
    pub today_invoices: i64,
    /// Average length of today's finished sessions, in hours
    pub avg_session_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub action: String,
    pub table: String,
    pub customer: String,
    /// Start time as `HH:MM` in business time
    pub time: String,
}
