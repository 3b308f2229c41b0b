use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use super::upload::{read_replace_form, read_upload_form};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::asset::{AssetListResponse, AssetResponse, ReorderRequest, UpdateAssetRequest};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{owner_id}/avatars",
    tag = "Avatars",
    operation_id = "listAvatars",
    summary = "List a user's avatars",
    params(("owner_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Avatars in display order", body = AssetListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_avatars(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<AssetListResponse>, AppError> {
    let assets = state.avatars.list_by_owner(owner_id).await?;
    Ok(Json(assets.into()))
}

#[utoipa::path(
    post,
    path = "/{owner_id}/avatars",
    tag = "Avatars",
    operation_id = "uploadAvatar",
    summary = "Upload an avatar",
    description = "Uploads an avatar from the `file` multipart field. A crop may be given with \
        `displayed_width`, `displayed_height`, `crop_x`, `crop_y`, `crop_width` and \
        `crop_height`, measured on the image as it was displayed; it is stored normalized to \
        the original image.",
    params(("owner_id" = Uuid, Path, description = "User ID")),
    request_body(content_type = "multipart/form-data", description = "Image file, options and crop"),
    responses(
        (status = 201, description = "Avatar stored", body = AssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 422, description = "Not a supported image (UNPROCESSABLE_IMAGE)", body = ErrorBody),
        (status = 502, description = "Blob store failure (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_upload_form(multipart, state.config.storage.max_upload_size).await?;
    let asset = state.avatars.upload(owner_id, form.data, form.options).await?;
    Ok((StatusCode::CREATED, Json(AssetResponse::from(asset))))
}

#[utoipa::path(
    put,
    path = "/{owner_id}/avatars/reorder",
    tag = "Avatars",
    operation_id = "reorderAvatars",
    summary = "Reorder a user's avatars",
    description = "`asset_ids` must list every avatar of the user exactly once; otherwise \
        nothing is changed.",
    params(("owner_id" = Uuid, Path, description = "User ID")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Avatars in the new order", body = AssetListResponse),
        (status = 400, description = "Not a permutation (INVALID_REORDER)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(count = payload.asset_ids.len()))]
pub async fn reorder_avatars(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    AppJson(payload): AppJson<ReorderRequest>,
) -> Result<Json<AssetListResponse>, AppError> {
    let assets = state.avatars.reorder(owner_id, &payload.asset_ids).await?;
    Ok(Json(assets.into()))
}

#[utoipa::path(
    post,
    path = "/{owner_id}/avatars/reconcile",
    tag = "Avatars",
    operation_id = "reconcileAvatars",
    summary = "Repair avatar ordering and featured flag",
    description = "Renumbers `sort_order` to 0..n in display order and leaves at most one \
        featured avatar.",
    params(("owner_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Repaired avatars", body = AssetListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn reconcile_avatars(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<AssetListResponse>, AppError> {
    let assets = state.avatars.reconcile(owner_id).await?;
    Ok(Json(assets.into()))
}

#[utoipa::path(
    get,
    path = "/{asset_id}",
    tag = "Avatars",
    operation_id = "getAvatar",
    summary = "Get an avatar",
    params(("asset_id" = Uuid, Path, description = "Avatar ID")),
    responses(
        (status = 200, description = "Avatar", body = AssetResponse),
        (status = 404, description = "Avatar not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state.avatars.get(asset_id).await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    patch,
    path = "/{asset_id}",
    tag = "Avatars",
    operation_id = "updateAvatar",
    summary = "Update an avatar's alt text or crop",
    description = "A new `crop` is measured on the stored image as displayed. `null` clears it.",
    params(("asset_id" = Uuid, Path, description = "Avatar ID")),
    request_body = UpdateAssetRequest,
    responses(
        (status = 200, description = "Avatar updated", body = AssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Avatar not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_avatar(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateAssetRequest>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state
        .avatars
        .update(asset_id, payload.into_update()?)
        .await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    delete,
    path = "/{asset_id}",
    tag = "Avatars",
    operation_id = "deleteAvatar",
    summary = "Delete an avatar",
    params(("asset_id" = Uuid, Path, description = "Avatar ID")),
    responses(
        (status = 204, description = "Avatar deleted"),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_avatar(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.avatars.delete(asset_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{asset_id}/file",
    tag = "Avatars",
    operation_id = "replaceAvatarFile",
    summary = "Replace an avatar's file",
    description = "Stores a new file for the avatar. The previous crop is cleared.",
    params(("asset_id" = Uuid, Path, description = "Avatar ID")),
    request_body(content_type = "multipart/form-data", description = "`file` and optional `compress`"),
    responses(
        (status = 200, description = "File replaced", body = AssetResponse),
        (status = 404, description = "Avatar not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Not a supported image (UNPROCESSABLE_IMAGE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn replace_avatar_file(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<AssetResponse>, AppError> {
    let form = read_replace_form(multipart, state.config.storage.max_upload_size).await?;
    let asset = state
        .avatars
        .replace(asset_id, form.data, form.compress)
        .await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    post,
    path = "/{asset_id}/featured",
    tag = "Avatars",
    operation_id = "setFeaturedAvatar",
    summary = "Make an avatar the user's current avatar",
    params(("asset_id" = Uuid, Path, description = "Avatar ID")),
    responses(
        (status = 200, description = "Avatar is now featured", body = AssetResponse),
        (status = 404, description = "Avatar not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn set_featured_avatar(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state.avatars.set_featured(asset_id).await?;
    Ok(Json(asset.into()))
}
