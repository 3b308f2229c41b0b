use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::path::ObjectPath;
use super::traits::{BlobStore, WriteMode, join_public_url};

/// Filesystem-backed blob store for one bucket.
///
/// Objects live at `{root}/{bucket}/{path}`. Writes go to a temp file under
/// `{root}/{bucket}/.tmp` first and are then moved into place, so readers never
/// observe a partially written object.
pub struct FilesystemBlobStore {
    bucket_dir: PathBuf,
    bucket: String,
    public_base_url: String,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating the bucket directory.
    pub async fn new(
        root: PathBuf,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        let bucket = bucket.into();
        let bucket_dir = root.join(&bucket);
        fs::create_dir_all(&bucket_dir).await?;
        fs::create_dir_all(bucket_dir.join(".tmp")).await?;
        Ok(Self {
            bucket_dir,
            bucket,
            public_base_url: public_base_url.into(),
            max_size,
        })
    }

    /// Filesystem location of an object.
    fn object_path(&self, path: &ObjectPath) -> PathBuf {
        self.bucket_dir.join(path.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.bucket_dir
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        path: &ObjectPath,
        data: &[u8],
        _content_type: &str,
        mode: WriteMode,
    ) -> Result<String, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let target = self.object_path(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let placed = match mode {
            // A hard link fails atomically when the target exists, unlike rename.
            WriteMode::Reject => match fs::hard_link(&temp_path, &target).await {
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    Err(StorageError::DuplicatePath(path.to_string()))
                }
                other => other.map_err(StorageError::from),
            },
            WriteMode::Upsert => fs::rename(&temp_path, &target)
                .await
                .map_err(StorageError::from),
        };

        // After a successful rename the temp file is already gone.
        let _ = fs::remove_file(&temp_path).await;
        placed?;

        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &ObjectPath) -> String {
        join_public_url(&self.public_base_url, &self.bucket, path)
    }

    async fn get(&self, path: &ObjectPath) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.object_path(path)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &ObjectPath) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.object_path(path)).await?)
    }

    async fn delete(&self, path: &ObjectPath) -> Result<bool, StorageError> {
        match fs::remove_file(self.object_path(path)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
