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
    path = "/{owner_id}/images",
    tag = "Product Images",
    operation_id = "listProductImages",
    summary = "List a product's images",
    description = "Returns the product's images in display order. The first image with \
        `is_featured = true` is the one shown as featured.",
    params(("owner_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Images in display order", body = AssetListResponse),
        (status = 500, description = "Metadata store failure (METADATA_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_product_images(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<AssetListResponse>, AppError> {
    let assets = state.product_images.list_by_owner(owner_id).await?;
    Ok(Json(assets.into()))
}

#[utoipa::path(
    post,
    path = "/{owner_id}/images",
    tag = "Product Images",
    operation_id = "uploadProductImage",
    summary = "Upload a product image",
    description = "Uploads an image from the `file` multipart field. Optional fields: `alt_text`, \
        `sort_order` (defaults to after the last image), `is_featured`, and `compress` \
        (default `true`). The product's first image is always featured.",
    params(("owner_id" = Uuid, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Image file and options"),
    responses(
        (status = 201, description = "Image stored", body = AssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Storage path collision (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Not a supported image (UNPROCESSABLE_IMAGE)", body = ErrorBody),
        (status = 502, description = "Blob store failure (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_product_image(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_upload_form(multipart, state.config.storage.max_upload_size).await?;
    let asset = state
        .product_images
        .upload(owner_id, form.data, form.options)
        .await?;
    Ok((StatusCode::CREATED, Json(AssetResponse::from(asset))))
}

#[utoipa::path(
    put,
    path = "/{owner_id}/images/reorder",
    tag = "Product Images",
    operation_id = "reorderProductImages",
    summary = "Reorder a product's images",
    description = "Sets the display order. `asset_ids` must list every image of the product \
        exactly once; otherwise nothing is changed.",
    params(("owner_id" = Uuid, Path, description = "Product ID")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Images in the new order", body = AssetListResponse),
        (status = 400, description = "Not a permutation (INVALID_REORDER)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(count = payload.asset_ids.len()))]
pub async fn reorder_product_images(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    AppJson(payload): AppJson<ReorderRequest>,
) -> Result<Json<AssetListResponse>, AppError> {
    let assets = state
        .product_images
        .reorder(owner_id, &payload.asset_ids)
        .await?;
    Ok(Json(assets.into()))
}

#[utoipa::path(
    post,
    path = "/{owner_id}/images/reconcile",
    tag = "Product Images",
    operation_id = "reconcileProductImages",
    summary = "Repair ordering and featured flag",
    description = "Renumbers `sort_order` to 0..n in display order and leaves exactly one \
        featured image. Safe to call repeatedly.",
    params(("owner_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Repaired images", body = AssetListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn reconcile_product_images(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<AssetListResponse>, AppError> {
    let assets = state.product_images.reconcile(owner_id).await?;
    Ok(Json(assets.into()))
}

#[utoipa::path(
    get,
    path = "/{asset_id}",
    tag = "Product Images",
    operation_id = "getProductImage",
    summary = "Get a product image",
    params(("asset_id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image", body = AssetResponse),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_product_image(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state.product_images.get(asset_id).await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    patch,
    path = "/{asset_id}",
    tag = "Product Images",
    operation_id = "updateProductImage",
    summary = "Update a product image's alt text",
    params(("asset_id" = Uuid, Path, description = "Image ID")),
    request_body = UpdateAssetRequest,
    responses(
        (status = 200, description = "Image updated", body = AssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_product_image(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateAssetRequest>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state
        .product_images
        .update(asset_id, payload.into_update()?)
        .await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    delete,
    path = "/{asset_id}",
    tag = "Product Images",
    operation_id = "deleteProductImage",
    summary = "Delete a product image",
    description = "Deletes the image. Deleting an image that no longer exists succeeds. If the \
        featured image is deleted, the first remaining image becomes featured.",
    params(("asset_id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 500, description = "Metadata store failure (METADATA_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_product_image(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.product_images.delete(asset_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{asset_id}/file",
    tag = "Product Images",
    operation_id = "replaceProductImageFile",
    summary = "Replace a product image's file",
    description = "Stores a new file for the image, keeping its ID, position, featured flag \
        and alt text. On failure the image is left unchanged.",
    params(("asset_id" = Uuid, Path, description = "Image ID")),
    request_body(content_type = "multipart/form-data", description = "`file` and optional `compress`"),
    responses(
        (status = 200, description = "File replaced", body = AssetResponse),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Not a supported image (UNPROCESSABLE_IMAGE)", body = ErrorBody),
        (status = 502, description = "Blob store failure (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn replace_product_image_file(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<AssetResponse>, AppError> {
    let form = read_replace_form(multipart, state.config.storage.max_upload_size).await?;
    let asset = state
        .product_images
        .replace(asset_id, form.data, form.compress)
        .await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    post,
    path = "/{asset_id}/featured",
    tag = "Product Images",
    operation_id = "setFeaturedProductImage",
    summary = "Make an image the product's featured image",
    params(("asset_id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image is now featured", body = AssetResponse),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn set_featured_product_image(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state.product_images.set_featured(asset_id).await?;
    Ok(Json(asset.into()))
}
