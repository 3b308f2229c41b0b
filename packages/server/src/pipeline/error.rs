use common::imaging::ImageError;
use common::storage::StorageError;
use common::viewport::ViewportError;
use thiserror::Error;
use uuid::Uuid;

use crate::records::RecordError;

/// Failures surfaced by [`AssetPipeline`](super::AssetPipeline) operations.
///
/// Orphaned blobs are never reported here; they are logged and swallowed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input could not be decoded or re-encoded. Nothing was written.
    #[error("Image could not be processed: {0}")]
    Compression(#[from] ImageError),

    #[error("Blob {op} failed for owner {owner_id} at '{path}': {source}")]
    Storage {
        op: &'static str,
        owner_id: Uuid,
        path: String,
        #[source]
        source: StorageError,
    },

    /// `id` is the owner for collection operations, the asset otherwise.
    #[error("Metadata {op} failed for {id}: {source}")]
    Metadata {
        op: &'static str,
        id: Uuid,
        #[source]
        source: RecordError,
    },

    /// The reorder request was not a permutation of the owner's assets.
    #[error("{0}")]
    InvalidReorder(String),

    #[error("{label} {id} not found")]
    NotFound { label: &'static str, id: Uuid },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub(crate) fn storage(
        op: &'static str,
        owner_id: Uuid,
        path: impl ToString,
        source: StorageError,
    ) -> Self {
        Self::Storage {
            op,
            owner_id,
            path: path.to_string(),
            source,
        }
    }

    pub(crate) fn metadata(op: &'static str, id: Uuid, source: RecordError) -> Self {
        Self::Metadata { op, id, source }
    }
}

impl From<ViewportError> for PipelineError {
    fn from(err: ViewportError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
