use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::Deserialize;

use super::error::StorageError;
use super::path::ObjectPath;
use super::traits::{BlobStore, WriteMode, join_public_url};

/// Connection settings for an S3-compatible object store.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub endpoint: String,
    #[serde(default = "default_region")]
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Use `{endpoint}/{bucket}` addressing instead of virtual-hosted buckets.
    #[serde(default = "default_path_style")]
    pub path_style: bool,
}

fn default_region() -> String {
    "us-east-1".into()
}
fn default_path_style() -> bool {
    true
}

/// Object-store-backed blob store for one bucket.
///
/// `WriteMode::Reject` is enforced with a HEAD before the PUT. S3 has no
/// conditional create in this client, so two writers racing on the same key
/// can both succeed; fresh keys make that a clock/random defect rather than a
/// normal event.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    name: String,
    public_base_url: String,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(
        config: &S3Config,
        bucket: &str,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid S3 credentials: {e}")))?;

        let mut handle = Bucket::new(bucket, region, credentials)
            .map_err(|e| StorageError::Backend(format!("invalid S3 bucket {bucket}: {e}")))?;
        if config.path_style {
            handle = handle.with_path_style();
        }

        Ok(Self {
            bucket: handle,
            name: bucket.to_string(),
            public_base_url: public_base_url.into(),
            max_size,
        })
    }
}

fn backend_error(op: &str, path: &ObjectPath, detail: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(format!("{op} {path}: {detail}"))
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

// The client is built without `fail-on-err`, so non-2xx responses arrive as
// status codes and are classified here.

fn check_size(len: usize, limit: u64) -> Result<(), StorageError> {
    let actual = len as u64;
    if actual > limit {
        return Err(StorageError::SizeLimitExceeded { actual, limit });
    }
    Ok(())
}

/// Outcome of a PUT given whether the key was already taken.
fn check_write_mode(mode: WriteMode, exists: bool, path: &ObjectPath) -> Result<(), StorageError> {
    if mode == WriteMode::Reject && exists {
        return Err(StorageError::DuplicatePath(path.to_string()));
    }
    Ok(())
}

fn put_status(status: u16, path: &ObjectPath) -> Result<(), StorageError> {
    if is_success(status) {
        Ok(())
    } else {
        Err(backend_error("put", path, format_args!("status {status}")))
    }
}

fn get_status(status: u16, path: &ObjectPath, body: &[u8]) -> Result<Vec<u8>, StorageError> {
    match status {
        404 => Err(StorageError::NotFound(path.to_string())),
        status if is_success(status) => Ok(body.to_vec()),
        status => Err(backend_error("get", path, format_args!("status {status}"))),
    }
}

/// HEAD and DELETE: 2xx means present (or removed), 404 means absent.
///
/// S3 answers 204 to a DELETE of a missing key, so `delete` may report
/// `true` for an object that was already gone. Either way the key is free.
fn presence_status(op: &str, status: u16, path: &ObjectPath) -> Result<bool, StorageError> {
    match status {
        404 => Ok(false),
        status if is_success(status) => Ok(true),
        status => Err(backend_error(op, path, format_args!("status {status}"))),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn bucket(&self) -> &str {
        &self.name
    }

    async fn put(
        &self,
        path: &ObjectPath,
        data: &[u8],
        content_type: &str,
        mode: WriteMode,
    ) -> Result<String, StorageError> {
        check_size(data.len(), self.max_size)?;
        if mode == WriteMode::Reject {
            check_write_mode(mode, self.exists(path).await?, path)?;
        }

        let response = self
            .bucket
            .put_object_with_content_type(path.as_str(), data, content_type)
            .await
            .map_err(|e| backend_error("put", path, e))?;
        put_status(response.status_code(), path)?;

        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &ObjectPath) -> String {
        join_public_url(&self.public_base_url, &self.name, path)
    }

    async fn get(&self, path: &ObjectPath) -> Result<Vec<u8>, StorageError> {
        let response = self
            .bucket
            .get_object(path.as_str())
            .await
            .map_err(|e| backend_error("get", path, e))?;
        get_status(response.status_code(), path, response.bytes())
    }

    async fn exists(&self, path: &ObjectPath) -> Result<bool, StorageError> {
        let (_, status) = self
            .bucket
            .head_object(path.as_str())
            .await
            .map_err(|e| backend_error("head", path, e))?;
        presence_status("head", status, path)
    }

    async fn delete(&self, path: &ObjectPath) -> Result<bool, StorageError> {
        let response = self
            .bucket
            .delete_object(path.as_str())
            .await
            .map_err(|e| backend_error("delete", path, e))?;
        presence_status("delete", response.status_code(), path)
    }
}
