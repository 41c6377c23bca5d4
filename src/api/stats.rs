//! Dashboard statistics endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, services::loans::DashboardStats};

/// Book and loan counters for the staff dashboard
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.loans.dashboard_stats().await?;
    Ok(Json(stats))
}
