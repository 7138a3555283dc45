//! Inspection lifecycle handlers

use crate::api::rest::extract::{parse_date_bound, parse_id, ApiJson, CurrentUser};
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use inspection_engine::{CustodyReport, InspectionFilter, NewInspection, Page, PageRequest, SortField, SortOrder};
use inspection_types::{
    DecisionTarget, EvidenceMutability, Inspection, InspectionDetail, InspectionId,
    InspectionStatus,
};
use serde::{Deserialize, Serialize};

/// Listing and export query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListInspectionsQuery {
    pub q: Option<String>,
    #[serde(alias = "planta_id")]
    pub plant_id: Option<String>,
    #[serde(alias = "naviera_id")]
    pub shipping_line_id: Option<String>,
    #[serde(alias = "estado")]
    pub status: Option<String>,
    pub inspector_id: Option<String>,
    #[serde(alias = "fecha_desde")]
    pub from: Option<String>,
    #[serde(alias = "fecha_hasta")]
    pub to: Option<String>,
    pub page: Option<u32>,
    #[serde(alias = "limit")]
    pub page_size: Option<u32>,
    #[serde(alias = "sort_by")]
    pub sort: Option<String>,
    #[serde(alias = "sort_order")]
    pub order: Option<String>,
}

impl ListInspectionsQuery {
    /// Blank values count as absent
    fn field(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn filter(&self) -> ApiResult<InspectionFilter> {
        let status = Self::field(&self.status)
            .map(|s| {
                s.parse::<InspectionStatus>()
                    .map_err(|e| ApiError::BadRequest(e.to_string()))
            })
            .transpose()?;

        Ok(InspectionFilter {
            q: Self::field(&self.q).map(str::to_string),
            plant_id: Self::field(&self.plant_id).map(parse_id).transpose()?,
            shipping_line_id: Self::field(&self.shipping_line_id)
                .map(parse_id)
                .transpose()?,
            status,
            inspector_id: Self::field(&self.inspector_id).map(parse_id).transpose()?,
            from: parse_date_bound("fecha_desde", self.from.as_deref(), false)?,
            to: parse_date_bound("fecha_hasta", self.to.as_deref(), true)?,
        })
    }

    pub fn page(&self) -> ApiResult<PageRequest> {
        let sort = match Self::field(&self.sort) {
            Some(raw) => SortField::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("cannot sort by '{raw}'")))?,
            None => SortField::default(),
        };
        let order = match Self::field(&self.order) {
            Some(raw) => SortOrder::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown sort order '{raw}'")))?,
            None => SortOrder::default(),
        };
        PageRequest::new(self.page, self.page_size)
            .map(|page| page.sorted_by(sort, order))
            .map_err(ApiError::BadRequest)
    }
}

/// Create inspection response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInspectionResponse {
    pub id: InspectionId,
    pub code: String,
    pub message: String,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    #[serde(alias = "status")]
    pub estado: DecisionTarget,
    #[serde(default, alias = "comment")]
    pub comentario: Option<String>,
}

/// List inspections visible to the caller
pub async fn list_inspections(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListInspectionsQuery>,
) -> ApiResult<Json<Page<Inspection>>> {
    let page = state
        .engine
        .list(&current.caller, query.filter()?, query.page()?)
        .await?;
    Ok(Json(page))
}

/// Create a pending inspection
pub async fn create_inspection(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(request): ApiJson<NewInspection>,
) -> ApiResult<(StatusCode, Json<CreateInspectionResponse>)> {
    let inspection = state.engine.create(&current.caller, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateInspectionResponse {
            id: inspection.id,
            code: inspection.code.to_string(),
            message: "Inspección creada".to_string(),
        }),
    ))
}

/// Full inspection detail
pub async fn get_inspection(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InspectionDetail>> {
    let id: InspectionId = parse_id(&id)?;
    Ok(Json(state.engine.get(&current.caller, &id).await?))
}

/// Delete an inspection with its evidence
pub async fn delete_inspection(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: InspectionId = parse_id(&id)?;
    state.engine.delete(&current.caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approve or reject
pub async fn change_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ChangeStatusRequest>,
) -> ApiResult<Json<Inspection>> {
    let id: InspectionId = parse_id(&id)?;
    let updated = state
        .engine
        .transition(
            &current.caller,
            &id,
            request.estado,
            request.comentario.as_deref(),
        )
        .await?;
    Ok(Json(updated))
}

/// Whether evidence may still change
pub async fn get_mutability(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<EvidenceMutability>> {
    let id: InspectionId = parse_id(&id)?;
    Ok(Json(
        state.engine.evidence_mutability(&current.caller, &id).await?,
    ))
}

/// Recompute evidence hashes
pub async fn verify_custody(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<CustodyReport>> {
    let id: InspectionId = parse_id(&id)?;
    Ok(Json(state.engine.custody(&current.caller, &id).await?))
}

/// CSV export with the listing filters
pub async fn export_csv(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListInspectionsQuery>,
) -> ApiResult<impl IntoResponse> {
    let export = state
        .reports
        .export_csv(&current.caller, query.filter()?, query.page()?)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.file_name),
            ),
        ],
        export.body,
    ))
}
