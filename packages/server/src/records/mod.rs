//! Asset metadata store.
//!
//! No uniqueness constraint on the featured flag is assumed; callers enforce
//! collection invariants by reading the owner's full set and writing back.

/// Copy the patch fields every asset table shares onto an active model and
/// bump `updated_at`. Per-table fields are applied by the caller.
macro_rules! apply_shared_patch {
    ($active:ident, $patch:ident) => {
        if let Some(alt_text) = $patch.alt_text {
            $active.alt_text = Set(alt_text);
        }
        if let Some(sort_order) = $patch.sort_order {
            $active.sort_order = Set(sort_order);
        }
        if let Some(is_featured) = $patch.is_featured {
            $active.is_featured = Set(is_featured);
        }
        if let Some(file) = $patch.file {
            $active.storage_path = Set(file.storage_path.to_string());
            $active.url = Set(file.url);
            $active.file_size = Set(to_db_int(file.file_size, "file_size")?);
            $active.width = Set(to_db_dim(file.width, "width")?);
            $active.height = Set(to_db_dim(file.height, "height")?);
            $active.mime_type = Set(file.mime_type);
        }
        $active.updated_at = Set(Utc::now());
    };
}

mod memory;
mod product_image;
mod table;
mod user_avatar;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::model::{Asset, AssetClass, AssetPatch, NewAsset};

pub use memory::MemoryAssetRecords;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Asset {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Stored row is invalid: {0}")]
    Corrupt(String),
}

/// CRUD over one asset class's metadata rows.
#[async_trait]
pub trait AssetRecords: Send + Sync {
    /// Insert a row, assigning its id (and its `sort_order` if not given).
    async fn insert(&self, asset: NewAsset) -> Result<Asset, RecordError>;

    async fn get(&self, id: Uuid) -> Result<Asset, RecordError>;

    /// All rows for an owner ordered by `sort_order`, ties in creation order.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, RecordError>;

    async fn update(&self, id: Uuid, patch: AssetPatch) -> Result<Asset, RecordError>;

    /// Returns `false` if the row did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, RecordError>;
}

/// SeaORM-backed records for one asset class.
pub struct SeaOrmAssetRecords {
    db: DatabaseConnection,
    class: AssetClass,
}

impl SeaOrmAssetRecords {
    pub fn new(db: DatabaseConnection, class: AssetClass) -> Self {
        Self { db, class }
    }
}

#[async_trait]
impl AssetRecords for SeaOrmAssetRecords {
    async fn insert(&self, asset: NewAsset) -> Result<Asset, RecordError> {
        match self.class {
            AssetClass::ProductImage => product_image::insert(&self.db, asset).await,
            AssetClass::UserAvatar => user_avatar::insert(&self.db, asset).await,
        }
    }

    async fn get(&self, id: Uuid) -> Result<Asset, RecordError> {
        match self.class {
            AssetClass::ProductImage => product_image::get(&self.db, id).await,
            AssetClass::UserAvatar => user_avatar::get(&self.db, id).await,
        }
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, RecordError> {
        match self.class {
            AssetClass::ProductImage => product_image::list_by_owner(&self.db, owner_id).await,
            AssetClass::UserAvatar => user_avatar::list_by_owner(&self.db, owner_id).await,
        }
    }

    async fn update(&self, id: Uuid, patch: AssetPatch) -> Result<Asset, RecordError> {
        match self.class {
            AssetClass::ProductImage => product_image::update(&self.db, id, patch).await,
            AssetClass::UserAvatar => user_avatar::update(&self.db, id, patch).await,
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RecordError> {
        match self.class {
            AssetClass::ProductImage => product_image::delete(&self.db, id).await,
            AssetClass::UserAvatar => user_avatar::delete(&self.db, id).await,
        }
    }
}

fn to_db_int(value: u64, field: &str) -> Result<i64, RecordError> {
    i64::try_from(value).map_err(|_| RecordError::Corrupt(format!("{field} out of range")))
}

fn to_db_dim(value: u32, field: &str) -> Result<i32, RecordError> {
    i32::try_from(value).map_err(|_| RecordError::Corrupt(format!("{field} out of range")))
}

fn from_db_int(value: i64, field: &str) -> Result<u64, RecordError> {
    u64::try_from(value).map_err(|_| RecordError::Corrupt(format!("negative {field}")))
}

fn from_db_dim(value: i32, field: &str) -> Result<u32, RecordError> {
    u32::try_from(value).map_err(|_| RecordError::Corrupt(format!("negative {field}")))
}
