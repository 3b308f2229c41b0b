//! Asset pipeline: keeps the blob store and the metadata store consistent.
//!
//! Each mutating operation is an ordered sequence of single-store steps with
//! its own compensation:
//!
//! | Operation | Order | On failure |
//! |---|---|---|
//! | upload | compress, put blob, shift later rows, insert row | shift or insert fails: delete the new blob |
//! | delete | delete row, delete blob, promote | blob delete fails: logged only |
//! | replace | compress, put new blob, update row, delete old blob | row update fails: delete the new blob |
//! | set_featured / reorder | per-row updates | not atomic; reads tolerate partial writes |
//!
//! A metadata row never points at a blob that was not written. A blob without
//! a row is acceptable and is logged.

pub mod error;
pub mod model;
pub mod ordering;

use std::sync::Arc;

use common::imaging::{self, CompressOptions, ImageError, ImageInfo};
use common::storage::{BlobStore, ObjectPath};
use common::viewport::{Rect, Size, Viewport, to_normalized_viewport};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::records::{AssetRecords, RecordError};

pub use error::PipelineError;
pub use model::{Asset, AssetClass, AssetPatch, NewAsset, StoredFile};

/// A crop drawn over the image as it was rendered on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSelection {
    pub displayed: Size,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Run the compressor before storing. When off, the bytes are stored as
    /// received (they must still decode).
    pub compress: bool,
    pub alt_text: Option<String>,
    pub sort_order: Option<i32>,
    pub is_featured: bool,
    /// Avatar only.
    pub crop: Option<CropSelection>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            compress: true,
            alt_text: None,
            sort_order: None,
            is_featured: false,
            crop: None,
        }
    }
}

/// Editable metadata. Outer `None` leaves the field unchanged, `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct AssetUpdate {
    pub alt_text: Option<Option<String>>,
    /// Avatar only. Mapped against the stored image's dimensions.
    pub crop: Option<Option<CropSelection>>,
}

/// Bytes ready to be written, with what they decode to.
struct Prepared {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    mime_type: &'static str,
    extension: &'static str,
    source: ImageInfo,
}

/// Orchestrates uploads and collection edits for one asset class.
pub struct AssetPipeline {
    class: AssetClass,
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn AssetRecords>,
    compression: CompressOptions,
    max_upload_size: u64,
}

impl AssetPipeline {
    pub fn new(
        class: AssetClass,
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn AssetRecords>,
        compression: CompressOptions,
        max_upload_size: u64,
    ) -> Self {
        Self {
            class,
            blobs,
            records,
            compression,
            max_upload_size,
        }
    }

    pub fn class(&self) -> AssetClass {
        self.class
    }

    pub fn blob_store(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    /// Compress, store and record a new asset.
    ///
    /// The owner's first asset is always featured for classes that require
    /// one. A featured upload clears the flag on the owner's other assets.
    #[instrument(
        skip(self, data, options),
        fields(class = self.class.label(), owner_id = %owner_id, size = data.len())
    )]
    pub async fn upload(
        &self,
        owner_id: Uuid,
        data: Vec<u8>,
        options: UploadOptions,
    ) -> Result<Asset, PipelineError> {
        self.validate_bytes(&data)?;
        if let Some(position) = options.sort_order
            && !(0..=ordering::MAX_SORT_ORDER).contains(&position)
        {
            return Err(PipelineError::InvalidInput(format!(
                "Sort order must be between 0 and {}, got {position}",
                ordering::MAX_SORT_ORDER
            )));
        }
        if options.crop.is_some() && !self.class.supports_viewport() {
            return Err(PipelineError::InvalidInput(format!(
                "{} uploads do not accept a crop",
                self.class.label()
            )));
        }

        let prepared = self.prepare(data, options.compress).await?;
        let viewport = options
            .crop
            .map(|crop| {
                let original = Size::new(
                    f64::from(prepared.source.width),
                    f64::from(prepared.source.height),
                );
                to_normalized_viewport(original, crop.displayed, crop.rect)
            })
            .transpose()?;

        let existing = self.owned(owner_id, "list").await?;
        let is_featured =
            options.is_featured || (self.class.requires_featured() && existing.is_empty());

        let shifts = match options.sort_order {
            Some(position) => ordering::insert_at_plan(&existing, position)
                .map_err(PipelineError::InvalidInput)?,
            None => Vec::new(),
        };

        let file = self.store(owner_id, &prepared).await?;
        if let Err(e) = self.apply_sort_orders(owner_id, &shifts).await {
            // Rows already moved only leave a gap, never a tie.
            self.discard_blob("upload", owner_id, &file.storage_path).await;
            return Err(e);
        }
        let new_asset = NewAsset {
            owner_id,
            file,
            alt_text: normalize_alt_text(options.alt_text),
            sort_order: options.sort_order,
            is_featured,
            viewport,
        };
        let path = new_asset.file.storage_path.clone();

        let asset = match self.records.insert(new_asset).await {
            Ok(asset) => asset,
            Err(source) => {
                warn!(
                    op = "upload",
                    owner_id = %owner_id,
                    path = %path,
                    error = %source,
                    "Metadata insert failed, removing stored blob"
                );
                self.discard_blob("upload", owner_id, &path).await;
                return Err(PipelineError::metadata("insert", owner_id, source));
            }
        };

        if asset.is_featured {
            let others: Vec<(Uuid, bool)> = existing
                .iter()
                .filter(|a| a.is_featured)
                .map(|a| (a.id, false))
                .collect();
            self.apply_featured(owner_id, &others).await?;
        }

        info!(asset_id = %asset.id, path = %asset.storage_path, "Uploaded asset");
        Ok(asset)
    }

    /// Remove an asset's row, then its blob.
    ///
    /// Returns the removed asset, or `None` if it was already gone.
    #[instrument(skip(self), fields(class = self.class.label()))]
    pub async fn delete(&self, asset_id: Uuid) -> Result<Option<Asset>, PipelineError> {
        let asset = match self.records.get(asset_id).await {
            Ok(asset) => asset,
            Err(RecordError::NotFound(_)) => {
                debug!(asset_id = %asset_id, "Asset already deleted");
                return Ok(None);
            }
            Err(source) => return Err(PipelineError::metadata("get", asset_id, source)),
        };

        match self.records.delete(asset_id).await {
            Ok(_) | Err(RecordError::NotFound(_)) => {}
            Err(source) => return Err(PipelineError::metadata("delete", asset_id, source)),
        }

        self.discard_blob("delete", asset.owner_id, &asset.storage_path)
            .await;

        if asset.is_featured && self.class.requires_featured() {
            let remaining = self.owned(asset.owner_id, "list").await?;
            let plan = ordering::featured_plan(&remaining, true);
            self.apply_featured(asset.owner_id, &plan).await?;
        }

        info!(asset_id = %asset_id, owner_id = %asset.owner_id, "Deleted asset");
        Ok(Some(asset))
    }

    /// Swap an asset's bytes, keeping its id, position, flag and alt text.
    ///
    /// If the new bytes cannot be stored and recorded, the asset is unchanged.
    /// An avatar's crop is cleared since it described the previous image.
    #[instrument(skip(self, data), fields(class = self.class.label(), size = data.len()))]
    pub async fn replace(
        &self,
        asset_id: Uuid,
        data: Vec<u8>,
        compress: bool,
    ) -> Result<Asset, PipelineError> {
        self.validate_bytes(&data)?;
        let current = self.find(asset_id).await?;
        let owner_id = current.owner_id;

        let prepared = self.prepare(data, compress).await?;
        let file = self.store(owner_id, &prepared).await?;
        let new_path = file.storage_path.clone();

        let patch = AssetPatch {
            file: Some(file),
            viewport: self.class.supports_viewport().then_some(None),
            ..Default::default()
        };
        let updated = match self.records.update(asset_id, patch).await {
            Ok(asset) => asset,
            Err(source) => {
                warn!(
                    op = "replace",
                    owner_id = %owner_id,
                    path = %new_path,
                    error = %source,
                    "Metadata update failed, removing new blob"
                );
                self.discard_blob("replace", owner_id, &new_path).await;
                return Err(match source {
                    RecordError::NotFound(id) => self.not_found(id),
                    source => PipelineError::metadata("update", asset_id, source),
                });
            }
        };

        if current.storage_path != updated.storage_path {
            self.discard_blob("replace", owner_id, &current.storage_path)
                .await;
        }

        info!(asset_id = %asset_id, path = %updated.storage_path, "Replaced asset file");
        Ok(updated)
    }

    /// Make `asset_id` the owner's only featured asset.
    #[instrument(skip(self), fields(class = self.class.label()))]
    pub async fn set_featured(&self, asset_id: Uuid) -> Result<Asset, PipelineError> {
        let target = self.find(asset_id).await?;
        let current = self.owned(target.owner_id, "list").await?;

        let plan = ordering::feature_plan(&current, asset_id);
        self.apply_featured(target.owner_id, &plan).await?;

        info!(asset_id = %asset_id, owner_id = %target.owner_id, "Set featured asset");
        self.find(asset_id).await
    }

    /// Persist a new display order. `asset_ids` must be a permutation of the
    /// owner's assets; otherwise nothing is written.
    #[instrument(skip(self, asset_ids), fields(class = self.class.label(), count = asset_ids.len()))]
    pub async fn reorder(
        &self,
        owner_id: Uuid,
        asset_ids: &[Uuid],
    ) -> Result<Vec<Asset>, PipelineError> {
        let current = self.owned(owner_id, "list").await?;
        ordering::validate_permutation(&current, asset_ids)
            .map_err(PipelineError::InvalidReorder)?;

        let plan = ordering::reorder_plan(&current, asset_ids);
        self.apply_sort_orders(owner_id, &plan).await?;

        info!(owner_id = %owner_id, updated = plan.len(), "Reordered assets");
        self.list_by_owner(owner_id).await
    }

    /// Edit alt text and, for avatars, the crop.
    #[instrument(skip(self, update), fields(class = self.class.label()))]
    pub async fn update(&self, asset_id: Uuid, update: AssetUpdate) -> Result<Asset, PipelineError> {
        if matches!(update.crop, Some(Some(_))) && !self.class.supports_viewport() {
            return Err(PipelineError::InvalidInput(format!(
                "{} does not support a crop",
                self.class.label()
            )));
        }
        let current = self.find(asset_id).await?;

        let viewport = match update.crop {
            None => None,
            Some(None) => self.class.supports_viewport().then_some(None),
            Some(Some(crop)) => Some(Some(self.viewport_on(&current, crop)?)),
        };
        let patch = AssetPatch {
            alt_text: update.alt_text.map(normalize_alt_text),
            viewport,
            ..Default::default()
        };
        if patch.is_empty() {
            return Ok(current);
        }

        self.records
            .update(asset_id, patch)
            .await
            .map_err(|source| match source {
                RecordError::NotFound(id) => self.not_found(id),
                source => PipelineError::metadata("update", asset_id, source),
            })
    }

    /// The owner's assets in display order. Duplicate `sort_order` values
    /// keep the order the store returned them in.
    #[instrument(skip(self), fields(class = self.class.label()))]
    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, PipelineError> {
        self.owned(owner_id, "list").await
    }

    pub async fn get(&self, asset_id: Uuid) -> Result<Asset, PipelineError> {
        self.find(asset_id).await
    }

    /// Rewrite what partial multi-row writes may have left behind:
    /// `sort_order` becomes `0..n` in display order, and the featured flag
    /// is made unique (and present, where the class requires it).
    #[instrument(skip(self), fields(class = self.class.label()))]
    pub async fn reconcile(&self, owner_id: Uuid) -> Result<Vec<Asset>, PipelineError> {
        let arranged = self.owned(owner_id, "list").await?;
        let ids: Vec<Uuid> = arranged.iter().map(|a| a.id).collect();

        let orders = ordering::reorder_plan(&arranged, &ids);
        self.apply_sort_orders(owner_id, &orders).await?;

        let flags = ordering::featured_plan(&arranged, self.class.requires_featured());
        self.apply_featured(owner_id, &flags).await?;

        if !orders.is_empty() || !flags.is_empty() {
            info!(
                owner_id = %owner_id,
                sort_orders = orders.len(),
                featured = flags.len(),
                "Reconciled assets"
            );
        }
        self.list_by_owner(owner_id).await
    }

    fn validate_bytes(&self, data: &[u8]) -> Result<(), PipelineError> {
        if data.is_empty() {
            return Err(PipelineError::InvalidInput("File is empty".into()));
        }
        let size = data.len() as u64;
        if size > self.max_upload_size {
            return Err(PipelineError::InvalidInput(format!(
                "File is {size} bytes, maximum is {} bytes",
                self.max_upload_size
            )));
        }
        Ok(())
    }

    /// Decode and optionally compress on the blocking pool.
    async fn prepare(&self, data: Vec<u8>, compress: bool) -> Result<Prepared, PipelineError> {
        let options = self.compression;
        let prepared = tokio::task::spawn_blocking(move || -> Result<Prepared, ImageError> {
            if compress {
                let out = imaging::compress(&data, &options)?;
                Ok(Prepared {
                    width: out.width,
                    height: out.height,
                    mime_type: out.format.mime_type(),
                    extension: out.format.extension(),
                    source: out.source,
                    bytes: out.bytes,
                })
            } else {
                let info = imaging::inspect(&data)?;
                Ok(Prepared {
                    width: info.width,
                    height: info.height,
                    mime_type: info.mime_type(),
                    extension: info.extension(),
                    source: info,
                    bytes: data,
                })
            }
        })
        .await
        .map_err(|e| PipelineError::Internal(format!("image task failed: {e}")))?;

        prepared.map_err(PipelineError::Compression)
    }

    async fn store(&self, owner_id: Uuid, prepared: &Prepared) -> Result<StoredFile, PipelineError> {
        let path = self
            .class
            .object_path(owner_id, prepared.extension)
            .map_err(|e| PipelineError::storage("put", owner_id, "", e))?;

        let url = self
            .blobs
            .put(
                &path,
                &prepared.bytes,
                prepared.mime_type,
                self.class.write_mode(),
            )
            .await
            .map_err(|e| PipelineError::storage("put", owner_id, &path, e))?;

        debug!(path = %path, bytes = prepared.bytes.len(), "Stored blob");
        Ok(StoredFile {
            storage_path: path,
            url,
            file_size: prepared.bytes.len() as u64,
            width: prepared.width,
            height: prepared.height,
            mime_type: prepared.mime_type.to_string(),
        })
    }

    /// Best-effort blob removal. A failure leaves an unreferenced blob.
    async fn discard_blob(&self, op: &'static str, owner_id: Uuid, path: &ObjectPath) {
        match self.blobs.delete(path).await {
            Ok(true) => debug!(op, path = %path, "Removed blob"),
            Ok(false) => debug!(op, path = %path, "Blob already absent"),
            Err(e) => warn!(
                op,
                owner_id = %owner_id,
                path = %path,
                error = %e,
                "Failed to delete blob, leaving it orphaned"
            ),
        }
    }

    async fn find(&self, asset_id: Uuid) -> Result<Asset, PipelineError> {
        self.records
            .get(asset_id)
            .await
            .map_err(|source| match source {
                RecordError::NotFound(id) => self.not_found(id),
                source => PipelineError::metadata("get", asset_id, source),
            })
    }

    async fn owned(&self, owner_id: Uuid, op: &'static str) -> Result<Vec<Asset>, PipelineError> {
        let assets = self
            .records
            .list_by_owner(owner_id)
            .await
            .map_err(|source| PipelineError::metadata(op, owner_id, source))?;
        Ok(ordering::arrange(assets))
    }

    async fn apply_featured(
        &self,
        owner_id: Uuid,
        plan: &[(Uuid, bool)],
    ) -> Result<(), PipelineError> {
        for &(id, is_featured) in plan {
            self.records
                .update(id, AssetPatch::featured(is_featured))
                .await
                .map_err(|source| PipelineError::metadata("set_featured", owner_id, source))?;
        }
        Ok(())
    }

    async fn apply_sort_orders(
        &self,
        owner_id: Uuid,
        plan: &[(Uuid, i32)],
    ) -> Result<(), PipelineError> {
        for &(id, sort_order) in plan {
            self.records
                .update(id, AssetPatch::sort_order(sort_order))
                .await
                .map_err(|source| PipelineError::metadata("reorder", owner_id, source))?;
        }
        Ok(())
    }

    fn viewport_on(&self, asset: &Asset, crop: CropSelection) -> Result<Viewport, PipelineError> {
        // Stored bytes keep the original aspect ratio, so normalized
        // coordinates are the same against either size.
        let original = Size::new(f64::from(asset.width), f64::from(asset.height));
        Ok(to_normalized_viewport(original, crop.displayed, crop.rect)?)
    }

    fn not_found(&self, id: Uuid) -> PipelineError {
        PipelineError::NotFound {
            label: self.class.label(),
            id,
        }
    }
}

fn normalize_alt_text(alt_text: Option<String>) -> Option<String> {
    alt_text
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
