use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::services::{aggregate, AnalyticsSummary, TimeRange};
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub time_range: Option<String>,
    pub year: Option<i32>,
}

#[tracing::instrument(skip(state))]
pub async fn analytics_summary(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let ledgers = state.ledger.list_clients().await?;

    let time_range = TimeRange::from_code(query.time_range.as_deref().unwrap_or_default());
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    Ok(Json(aggregate(&ledgers, time_range, year)))
}
