use std::sync::Arc;

use common::storage::StorageError;

use crate::config::AppConfig;
use crate::pipeline::{AssetClass, AssetPipeline};
use crate::records::AssetRecords;
use crate::storage::open_blob_store;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub product_images: Arc<AssetPipeline>,
    pub avatars: Arc<AssetPipeline>,
}

impl AppState {
    /// Open both buckets and wire one pipeline per asset class.
    pub async fn open<F>(config: AppConfig, records: F) -> Result<Self, StorageError>
    where
        F: Fn(AssetClass) -> Arc<dyn AssetRecords>,
    {
        let product_images = AssetPipeline::new(
            AssetClass::ProductImage,
            open_blob_store(&config.storage, AssetClass::ProductImage).await?,
            records(AssetClass::ProductImage),
            config.imaging.product,
            config.storage.max_upload_size,
        );
        let avatars = AssetPipeline::new(
            AssetClass::UserAvatar,
            open_blob_store(&config.storage, AssetClass::UserAvatar).await?,
            records(AssetClass::UserAvatar),
            config.imaging.avatar,
            config.storage.max_upload_size,
        );

        Ok(Self {
            config: Arc::new(config),
            product_images: Arc::new(product_images),
            avatars: Arc::new(avatars),
        })
    }

    pub fn pipeline(&self, class: AssetClass) -> &AssetPipeline {
        match class {
            AssetClass::ProductImage => &self.product_images,
            AssetClass::UserAvatar => &self.avatars,
        }
    }
}
