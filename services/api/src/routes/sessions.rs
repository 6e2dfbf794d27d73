//! Session lifecycle and order endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::warn;

use crate::{
    billing,
    error::{ApiError, ApiResult},
    extract::ValidJson,
    middleware::AuthUser,
    models::{
        AddMinutesRequest, AddOrderRequest, AmountPreview, EndSessionResponse, ExpireSummary,
        OrdersResponse, SessionDetails, SessionOrder, SessionResponse, SessionsResponse,
        StartSessionRequest, TableSession, UpdateOrderStatusRequest, UpdatePresetDurationRequest,
        UpdateRemainingTimeRequest,
    },
    scheduler,
    state::AppState,
    validation,
};

/// Start a session on an available table
pub async fn start_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(payload): ValidJson<StartSessionRequest>,
) -> ApiResult<(StatusCode, Json<TableSession>)> {
    validation::validate_start_session(&payload).map_err(ApiError::Validation)?;

    let session = state
        .session_repository
        .start(&payload, user.id, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Get active sessions
pub async fn list_active_sessions(
    State(state): State<AppState>,
) -> ApiResult<Json<SessionsResponse>> {
    let sessions = state.session_repository.list_active().await?;
    Ok(Json(SessionsResponse { sessions }))
}

/// Get a session with its orders and running order total
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SessionDetails>> {
    let session = state.session_repository.get(id).await?;
    let orders = state.order_repository.list_for_session(id).await?;
    let total_order_amount = state.order_repository.total_for_session(id).await?;

    Ok(Json(SessionDetails {
        session,
        orders,
        total_order_amount,
    }))
}

/// Get orders for a session
pub async fn get_session_orders(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrdersResponse>> {
    // 404 for an unknown session rather than an empty list
    state.session_repository.get(id).await?;
    let orders = state.order_repository.list_for_session(id).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// Live billing preview
pub async fn calculate_amount(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AmountPreview>> {
    let session = state.session_repository.get(id).await?;
    let orders_total = state.order_repository.total_for_session(id).await?;
    let breakdown = billing::compute_amount(&session, orders_total, Utc::now());

    Ok(Json(AmountPreview {
        session_id: session.id,
        session_type: session.session_type,
        actual_minutes: breakdown.actual_minutes,
        hourly_rate: session.hourly_rate,
        table_amount: breakdown.table_amount,
        orders_amount: breakdown.orders_amount,
        total_amount: breakdown.total_amount,
    }))
}

/// Overwrite the remaining minutes
pub async fn update_remaining_time(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<UpdateRemainingTimeRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .session_repository
        .update_remaining_time(id, payload.remaining_minutes)
        .await?;

    Ok(Json(SessionResponse {
        message: "Time updated successfully".to_string(),
        session,
    }))
}

/// Extend a running session
pub async fn add_minutes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<AddMinutesRequest>,
) -> ApiResult<Json<SessionResponse>> {
    validation::validate_duration(payload.added_minutes, "added_minutes")
        .map_err(ApiError::Validation)?;

    let session = state
        .session_repository
        .add_minutes(id, payload.added_minutes)
        .await?;

    Ok(Json(SessionResponse {
        message: "Duration updated successfully".to_string(),
        session,
    }))
}

pub async fn update_preset_duration(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<UpdatePresetDurationRequest>,
) -> ApiResult<Json<SessionResponse>> {
    validation::validate_duration(payload.preset_duration_minutes, "preset_duration_minutes")
        .map_err(ApiError::Validation)?;

    let session = state
        .session_repository
        .update_preset_duration(id, payload.preset_duration_minutes)
        .await?;

    Ok(Json(SessionResponse {
        message: "Preset duration updated successfully".to_string(),
        session,
    }))
}

/// End a session and issue its invoice.
///
/// The session stays completed even when invoicing fails; the failure is
/// reported in `invoice_error` with a 200 status.
pub async fn end_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<EndSessionResponse>> {
    let now = Utc::now();
    let session = state.session_repository.end(id, now).await?;

    let response = match state
        .invoice_issuer
        .issue_for_session(id, user.id, now)
        .await
    {
        Ok(invoice) => EndSessionResponse {
            message: "Session ended successfully".to_string(),
            session,
            invoice_id: Some(invoice.id),
            total_amount: invoice.amount,
            invoice_error: None,
        },
        Err(e) => {
            warn!("Session {} ended but invoicing failed: {}", id, e);
            EndSessionResponse {
                message: "Session ended successfully".to_string(),
                session,
                invoice_id: None,
                total_amount: 0.0,
                invoice_error: Some(e.public_message()),
            }
        }
    };

    Ok(Json(response))
}

/// Add order lines to an active session
pub async fn add_order(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<AddOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrdersResponse>)> {
    validation::validate_order_items(&payload.items).map_err(ApiError::Validation)?;

    let orders = state.order_repository.add_items(&payload).await?;
    Ok((StatusCode::CREATED, Json(OrdersResponse { orders })))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<UpdateOrderStatusRequest>,
) -> ApiResult<Json<SessionOrder>> {
    let order = state
        .order_repository
        .update_status(id, payload.status)
        .await?;
    Ok(Json(order))
}

/// Run the auto-expire batch now
pub async fn expire_sessions(State(state): State<AppState>) -> ApiResult<Json<ExpireSummary>> {
    let summary = scheduler::expire_sessions(&state, Utc::now()).await?;
    Ok(Json(summary))
}
