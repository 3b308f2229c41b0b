use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::S3BlobStore;
use common::storage::{BlobStore, StorageError};
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::pipeline::AssetClass;

/// Open the configured blob backend for one asset class's bucket.
pub async fn open_blob_store(
    config: &StorageConfig,
    class: AssetClass,
) -> Result<Arc<dyn BlobStore>, StorageError> {
    let bucket = class.bucket();
    match config.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemBlobStore::new(
                config.root.clone(),
                bucket,
                config.public_base_url.clone(),
                config.max_upload_size,
            )
            .await?;
            info!(bucket, root = %config.root.display(), "Opened filesystem blob store");
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                StorageError::Backend("storage.s3 must be set for the s3 backend".into())
            })?;
            let store = S3BlobStore::new(
                s3,
                bucket,
                config.public_base_url.clone(),
                config.max_upload_size,
            )?;
            info!(bucket, endpoint = %s3.endpoint, "Opened S3 blob store");
            Ok(Arc::new(store))
        }
    }
}
