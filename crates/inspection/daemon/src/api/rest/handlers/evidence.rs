//! Evidence photo and signature handlers

use crate::api::rest::extract::{parse_id, CurrentUser};
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use inspection_engine::EvidenceUpload;
use inspection_types::{Inspection, InspectionId, Photo, PhotoId};

/// Multipart field names accepted for photo batches
const PHOTO_FIELDS: [&str; 2] = ["files", "files[]"];

/// Multipart field name for the signature image
const SIGNATURE_FIELD: &str = "file";

async fn read_upload(field: Field<'_>) -> ApiResult<EvidenceUpload> {
    let content_type = field.content_type().map(str::to_string);
    let file_name = field.file_name().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("unreadable upload: {e}")))?;
    Ok(EvidenceUpload {
        bytes: bytes.to_vec(),
        content_type,
        file_name,
        taken_at: None,
    })
}

async fn collect_uploads(multipart: &mut Multipart, names: &[&str]) -> ApiResult<Vec<EvidenceUpload>> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name().is_some_and(|name| names.contains(&name)) {
            uploads.push(read_upload(field).await?);
        }
    }
    Ok(uploads)
}

/// Attach a batch of photos, in submission order
pub async fn upload_photos(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Vec<Photo>>)> {
    let id: InspectionId = parse_id(&id)?;
    let uploads = collect_uploads(&mut multipart, &PHOTO_FIELDS).await?;
    let photos = state
        .engine
        .attach_evidence(&current.caller, &id, uploads)
        .await?;
    Ok((StatusCode::CREATED, Json(photos)))
}

/// Delete one photo unless the inspection is approved
pub async fn delete_photo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, photo_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let id: InspectionId = parse_id(&id)?;
    let photo_id: PhotoId = parse_id(&photo_id)?;
    state
        .engine
        .remove_evidence(&current.caller, &id, &photo_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Store or replace the signature
pub async fn upload_signature(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<Inspection>> {
    let id: InspectionId = parse_id(&id)?;
    let upload = collect_uploads(&mut multipart, &[SIGNATURE_FIELD])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Validation("a signature file is required".to_string()))?;
    let inspection = state
        .engine
        .attach_signature(&current.caller, &id, upload)
        .await?;
    Ok(Json(inspection))
}
