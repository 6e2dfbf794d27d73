//! Table registry endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::{ApiError, ApiResult},
    extract::ValidJson,
    middleware::AuthUser,
    models::{CreateTableRequest, Table, TableRateResponse, TablesResponse, UpdateRateRequest},
    state::AppState,
    validation,
};

/// Get all tables
pub async fn list_tables(State(state): State<AppState>) -> ApiResult<Json<TablesResponse>> {
    let tables = state.table_repository.list().await?;
    Ok(Json(TablesResponse { tables }))
}

/// Register a new table (admin only)
pub async fn create_table(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(payload): ValidJson<CreateTableRequest>,
) -> ApiResult<(StatusCode, Json<Table>)> {
    user.require_admin()?;
    validation::validate_create_table(&payload).map_err(ApiError::Validation)?;

    let table = state.table_repository.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(table)))
}

/// Change a table's hourly rate (admin only)
pub async fn update_table_rate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<UpdateRateRequest>,
) -> ApiResult<Json<TableRateResponse>> {
    user.require_admin()?;
    validation::validate_rate(payload.hourly_rate).map_err(ApiError::Validation)?;

    let table = state
        .table_repository
        .update_rate(id, payload.hourly_rate)
        .await?;

    Ok(Json(TableRateResponse {
        message: "Table rate updated successfully".to_string(),
        table,
    }))
}
