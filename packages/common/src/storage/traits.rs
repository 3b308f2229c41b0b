use async_trait::async_trait;

use super::error::StorageError;
use super::path::ObjectPath;

/// What `put` does when an object already exists at the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with [`StorageError::DuplicatePath`].
    Reject,
    /// Replace the existing object.
    Upsert,
}

/// Path-addressed blob storage bound to a single bucket.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Name of the bucket this store writes to.
    fn bucket(&self) -> &str;

    /// Store bytes at `path` and return the object's public URL.
    async fn put(
        &self,
        path: &ObjectPath,
        data: &[u8],
        content_type: &str,
        mode: WriteMode,
    ) -> Result<String, StorageError>;

    /// Public URL for an object. Pure derivation; does not check existence.
    fn public_url(&self, path: &ObjectPath) -> String;

    /// Retrieve all bytes of an object.
    async fn get(&self, path: &ObjectPath) -> Result<Vec<u8>, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, path: &ObjectPath) -> Result<bool, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, path: &ObjectPath) -> Result<bool, StorageError>;
}

/// Join a public base URL, bucket and key without doubling slashes.
pub fn join_public_url(base_url: &str, bucket: &str, path: &ObjectPath) -> String {
    format!("{}/{bucket}/{path}", base_url.trim_end_matches('/'))
}
