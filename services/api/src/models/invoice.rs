//! Invoice and report models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::InvoiceStatus;

/// A frozen billing snapshot. Nothing here is recomputed from live data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub session_id: Option<i64>,
    pub customer_name: Option<String>,
    pub table_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub play_duration_minutes: i32,
    pub hourly_rate: f64,
    pub table_amount: f64,
    pub orders_amount: f64,
    pub discount: f64,
    pub amount: f64,
    pub services_detail: String,
    pub status: InvoiceStatus,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert; built by the issuer or from a manual request
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub session_id: Option<i64>,
    pub customer_name: Option<String>,
    pub table_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub play_duration_minutes: i32,
    pub hourly_rate: f64,
    pub table_amount: f64,
    pub orders_amount: f64,
    pub discount: f64,
    pub amount: f64,
    pub services_detail: String,
    pub created_by: i64,
}

/// Manual invoice not tied to a session
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceRequest {
    pub table_name: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub play_duration_minutes: i32,
    pub hourly_rate: f64,
    #[serde(default)]
    pub services_detail: String,
    #[serde(default)]
    pub service_total: f64,
    #[serde(default)]
    pub discount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<Invoice>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceStatusRequest {
    pub status: InvoiceStatus,
}

/// Count and money sums over a set of invoices
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportTotals {
    pub total_invoices: i64,
    pub total_revenue: f64,
    pub total_time_revenue: f64,
    pub total_service_revenue: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyReportQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: ReportTotals,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthlyReportQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub totals: ReportTotals,
}
