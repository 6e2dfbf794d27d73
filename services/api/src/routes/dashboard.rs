//! Dashboard endpoints

use axum::{Json, extract::State};
use chrono::Utc;

use crate::{
    error::ApiResult,
    models::{Activity, DashboardStats},
    period,
    state::AppState,
};

/// Today's revenue, invoice count, active sessions and average session length
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    let today = period::business_date(Utc::now(), state.business_offset);
    let (start, end) = period::day_window(today, state.business_offset)?;

    let stats = state.dashboard_repository.stats(start, end).await?;
    Ok(Json(stats))
}

/// Latest sessions started today
pub async fn activities(State(state): State<AppState>) -> ApiResult<Json<Vec<Activity>>> {
    let today = period::business_date(Utc::now(), state.business_offset);
    let (start, end) = period::day_window(today, state.business_offset)?;

    let activities = state
        .dashboard_repository
        .activities(start, end, state.business_offset)
        .await?;
    Ok(Json(activities))
}
