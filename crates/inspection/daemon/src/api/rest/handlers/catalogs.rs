//! Plant and shipping line handlers

use crate::api::rest::extract::{parse_id, ApiJson, CurrentUser};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use inspection_engine::{PlantInput, ShippingLineInput};
use inspection_types::{Plant, PlantId, ShippingLine, ShippingLineId};

/// List plants
pub async fn list_plants(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<Plant>>> {
    Ok(Json(state.catalog.list_plants(&current.caller).await?))
}

/// Create a plant
pub async fn create_plant(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(input): ApiJson<PlantInput>,
) -> ApiResult<(StatusCode, Json<Plant>)> {
    let plant = state.catalog.create_plant(&current.caller, input).await?;
    Ok((StatusCode::CREATED, Json(plant)))
}

/// Replace a plant's fields
pub async fn update_plant(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PlantInput>,
) -> ApiResult<Json<Plant>> {
    let id: PlantId = parse_id(&id)?;
    Ok(Json(
        state.catalog.update_plant(&current.caller, &id, input).await?,
    ))
}

/// Delete an unreferenced plant
pub async fn delete_plant(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: PlantId = parse_id(&id)?;
    state.catalog.delete_plant(&current.caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List shipping lines
pub async fn list_shipping_lines(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<ShippingLine>>> {
    Ok(Json(state.catalog.list_shipping_lines(&current.caller).await?))
}

/// Create a shipping line
pub async fn create_shipping_line(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(input): ApiJson<ShippingLineInput>,
) -> ApiResult<(StatusCode, Json<ShippingLine>)> {
    let line = state
        .catalog
        .create_shipping_line(&current.caller, input)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// Replace a shipping line's fields
pub async fn update_shipping_line(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ShippingLineInput>,
) -> ApiResult<Json<ShippingLine>> {
    let id: ShippingLineId = parse_id(&id)?;
    Ok(Json(
        state
            .catalog
            .update_shipping_line(&current.caller, &id, input)
            .await?,
    ))
}

/// Delete an unreferenced shipping line
pub async fn delete_shipping_line(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: ShippingLineId = parse_id(&id)?;
    state
        .catalog
        .delete_shipping_line(&current.caller, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
