//! Dashboard and summary handlers

use crate::api::rest::extract::{parse_date_bound, CurrentUser};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use inspection_reports::{Dashboard, ReportRange, Summary};
use serde::Deserialize;

/// Reporting window query params
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub fecha_desde: Option<String>,
    pub fecha_hasta: Option<String>,
}

impl RangeQuery {
    fn resolve(&self) -> ApiResult<ReportRange> {
        let from = parse_date_bound("fecha_desde", self.fecha_desde.as_deref(), false)?;
        let to = parse_date_bound("fecha_hasta", self.fecha_hasta.as_deref(), true)?;
        Ok(ReportRange::resolve(from, to, Utc::now())?)
    }
}

/// Dashboard aggregates
pub async fn get_dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Dashboard>> {
    let range = query.resolve()?;
    Ok(Json(state.reports.dashboard(&current.caller, range).await?))
}

/// Totals and approval rate
pub async fn get_summary(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Summary>> {
    let range = query.resolve()?;
    Ok(Json(state.reports.summary(&current.caller, range).await?))
}
