//! Play session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SessionOrder, SessionStatus, SessionType};

/// One timed occupancy of a table, joined with the table name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSession {
    pub id: i64,
    pub table_id: i64,
    pub table_name: String,
    pub customer_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub preset_duration_minutes: i32,
    pub remaining_minutes: Option<i32>,
    pub actual_duration_minutes: Option<i32>,
    /// Rate copied from the table when the session started
    pub hourly_rate: f64,
    pub prepaid_amount: f64,
    pub status: SessionStatus,
    pub session_type: SessionType,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for starting a session on an available table
#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    pub table_id: i64,
    pub customer_name: String,
    pub preset_duration_minutes: i32,
    #[serde(default)]
    pub prepaid_amount: f64,
    #[serde(default)]
    pub session_type: SessionType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRemainingTimeRequest {
    pub remaining_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct AddMinutesRequest {
    pub added_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePresetDurationRequest {
    pub preset_duration_minutes: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<TableSession>,
}

/// Acknowledgement for session mutations, carrying the updated session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub message: String,
    pub session: TableSession,
}

/// A session with its orders and the running (non-cancelled) order total
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDetails {
    #[serde(flatten)]
    pub session: TableSession,
    pub orders: Vec<SessionOrder>,
    pub total_order_amount: f64,
}

/// Live billing preview for a session
#[derive(Debug, Serialize, Deserialize)]
pub struct AmountPreview {
    pub session_id: i64,
    pub session_type: SessionType,
    pub actual_minutes: i64,
    pub hourly_rate: f64,
    pub table_amount: f64,
    pub orders_amount: f64,
    pub total_amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub message: String,
    pub session: TableSession,
    pub invoice_id: Option<i64>,
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceFailure {
    pub session_id: i64,
    pub error: String,
}

/// Outcome of one auto-expire run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpireSummary {
    pub expired_sessions: Vec<i64>,
    pub invoices_created: Vec<i64>,
    pub invoice_errors: Vec<InvoiceFailure>,
}
