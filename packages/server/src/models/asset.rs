use chrono::{DateTime, Utc};
use common::viewport::{Rect, Size, Viewport};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, validate_alt_text};
use crate::error::AppError;
use crate::pipeline::{Asset, AssetUpdate, CropSelection};

/// Response DTO for a single product image or avatar.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AssetResponse {
    /// Asset ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: Uuid,
    /// Product or user the asset belongs to.
    pub owner_id: Uuid,
    /// Public URL of the stored bytes.
    #[schema(example = "http://localhost:3000/media/product-images/01936f0e-1234-7abc-8000-000000000002/original/1730000000000-k3j9x0ab.jpg")]
    pub url: String,
    #[schema(example = "01936f0e-1234-7abc-8000-000000000002/original/1730000000000-k3j9x0ab.jpg")]
    pub storage_path: String,
    #[schema(example = "Rose gold ring, side view")]
    pub alt_text: Option<String>,
    #[schema(example = 0)]
    pub sort_order: i32,
    pub is_featured: bool,
    /// Size of the stored (compressed) file in bytes.
    #[schema(example = 248113)]
    pub file_size: u64,
    #[schema(example = 1920)]
    pub width: u32,
    #[schema(example = 1280)]
    pub height: u32,
    #[schema(example = "image/jpeg")]
    pub mime_type: String,
    /// Avatar crop, normalized to the original image.
    pub viewport: Option<Viewport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Asset> for AssetResponse {
    fn from(asset: Asset) -> Self {
        Self {
            id: asset.id,
            owner_id: asset.owner_id,
            url: asset.url,
            storage_path: asset.storage_path.to_string(),
            alt_text: asset.alt_text,
            sort_order: asset.sort_order,
            is_featured: asset.is_featured,
            file_size: asset.file_size,
            width: asset.width,
            height: asset.height,
            mime_type: asset.mime_type,
            viewport: asset.viewport,
            created_at: asset.created_at,
            updated_at: asset.updated_at,
        }
    }
}

/// Response DTO for an owner's assets, in display order.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AssetListResponse {
    pub assets: Vec<AssetResponse>,
    pub total: u64,
}

impl From<Vec<Asset>> for AssetListResponse {
    fn from(assets: Vec<Asset>) -> Self {
        let total = assets.len() as u64;
        Self {
            assets: assets.into_iter().map(Into::into).collect(),
            total,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReorderRequest {
    /// Every asset ID of the owner, in the new display order.
    pub asset_ids: Vec<Uuid>,
}

/// A crop rectangle drawn over the image as displayed to the user.
#[derive(Debug, Clone, Copy, Deserialize, utoipa::ToSchema)]
pub struct CropRequest {
    /// Rendered width of the image the crop was drawn on.
    #[schema(example = 500.0)]
    pub displayed_width: f64,
    #[schema(example = 1000.0)]
    pub displayed_height: f64,
    #[schema(example = 100.0)]
    pub crop_x: f64,
    #[schema(example = 100.0)]
    pub crop_y: f64,
    #[schema(example = 100.0)]
    pub crop_width: f64,
    #[schema(example = 100.0)]
    pub crop_height: f64,
}

impl From<CropRequest> for CropSelection {
    fn from(crop: CropRequest) -> Self {
        CropSelection {
            displayed: Size::new(crop.displayed_width, crop.displayed_height),
            rect: Rect::new(crop.crop_x, crop.crop_y, crop.crop_width, crop.crop_height),
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateAssetRequest {
    /// Omit to keep, `null` to clear.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub alt_text: Option<Option<String>>,
    /// Avatars only. Omit to keep, `null` to show the whole image.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<CropRequest>)]
    pub crop: Option<Option<CropRequest>>,
}

impl UpdateAssetRequest {
    pub fn into_update(self) -> Result<AssetUpdate, AppError> {
        if let Some(alt_text) = &self.alt_text {
            validate_alt_text(alt_text.as_deref())?;
        }
        Ok(AssetUpdate {
            alt_text: self.alt_text,
            crop: self.crop.map(|crop| crop.map(Into::into)),
        })
    }
}
