//! Invoice and report endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    error::{ApiError, ApiResult},
    extract::{ValidJson, ValidQuery},
    middleware::AuthUser,
    models::{
        CreateInvoiceRequest, DailyReport, DailyReportQuery, Invoice, InvoiceListQuery,
        InvoiceListResponse, MonthlyReport, MonthlyReportQuery, UpdateInvoiceStatusRequest,
    },
    period,
    state::AppState,
    validation,
};

/// Create a manual invoice
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(payload): ValidJson<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    validation::validate_create_invoice(&payload).map_err(ApiError::Validation)?;

    let invoice = state.invoice_issuer.issue_manual(&payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// List invoices, newest first
pub async fn list_invoices(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<InvoiceListQuery>,
) -> ApiResult<Json<InvoiceListResponse>> {
    let (limit, offset) = validation::page_bounds(&query);
    let invoices = state.invoice_repository.list(limit, offset).await?;

    Ok(Json(InvoiceListResponse {
        invoices,
        limit,
        offset,
    }))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Invoice>> {
    let invoice = state
        .invoice_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    Ok(Json(invoice))
}

pub async fn update_invoice_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<UpdateInvoiceStatusRequest>,
) -> ApiResult<Json<Invoice>> {
    let invoice = state
        .invoice_repository
        .update_status(id, payload.status)
        .await?;
    Ok(Json(invoice))
}

/// Totals for one business day, today by default
pub async fn daily_report(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<DailyReportQuery>,
) -> ApiResult<Json<DailyReport>> {
    let date = query
        .date
        .unwrap_or_else(|| period::business_date(Utc::now(), state.business_offset));
    let (start, end) = period::day_window(date, state.business_offset)?;
    let totals = state.invoice_repository.totals_between(start, end).await?;

    Ok(Json(DailyReport { date, totals }))
}

/// Totals for one business month, the current month by default
pub async fn monthly_report(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<MonthlyReportQuery>,
) -> ApiResult<Json<MonthlyReport>> {
    let (current_year, current_month) = period::business_month(Utc::now(), state.business_offset);
    let year = query.year.unwrap_or(current_year);
    let month = query.month.unwrap_or(current_month);

    let (start, end) = period::month_window(year, month, state.business_offset)?;
    let totals = state.invoice_repository.totals_between(start, end).await?;

    Ok(Json(MonthlyReport {
        year,
        month,
        totals,
    }))
}
