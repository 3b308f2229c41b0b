use chrono::{DateTime, Utc};
use common::storage::{ObjectPath, StorageError, WriteMode};
use common::viewport::Viewport;
use uuid::Uuid;

/// Kind of media asset. Each class has its own bucket and metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    ProductImage,
    UserAvatar,
}

impl AssetClass {
    /// Object store bucket holding this class's bytes.
    pub fn bucket(self) -> &'static str {
        match self {
            Self::ProductImage => "product-images",
            Self::UserAvatar => "user-avatars",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::ProductImage => "Product image",
            Self::UserAvatar => "Avatar",
        }
    }

    /// Product image paths are always fresh, so an existing object means the
    /// path generator misbehaved. Avatar writes upsert instead.
    pub fn write_mode(self) -> WriteMode {
        match self {
            Self::ProductImage => WriteMode::Reject,
            Self::UserAvatar => WriteMode::Upsert,
        }
    }

    /// Whether an owner with at least one asset must have exactly one featured.
    pub fn requires_featured(self) -> bool {
        matches!(self, Self::ProductImage)
    }

    pub fn supports_viewport(self) -> bool {
        matches!(self, Self::UserAvatar)
    }

    /// Fresh storage path for a new object of this class.
    pub fn object_path(self, owner_id: Uuid, extension: &str) -> Result<ObjectPath, StorageError> {
        match self {
            Self::ProductImage => ObjectPath::product_original(owner_id, extension),
            Self::UserAvatar => ObjectPath::avatar(owner_id, extension),
        }
    }

    pub fn from_bucket(bucket: &str) -> Option<Self> {
        [Self::ProductImage, Self::UserAvatar]
            .into_iter()
            .find(|class| class.bucket() == bucket)
    }
}

/// Bytes as they were written to the blob store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub storage_path: ObjectPath,
    pub url: String,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

/// One stored image and its metadata row.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub storage_path: ObjectPath,
    pub url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
    pub is_featured: bool,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    /// Avatar crop relative to the original image; `None` shows the whole image.
    pub viewport: Option<Viewport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert. The store assigns `id` and, when `sort_order` is `None`,
/// places the asset after every existing one of the same owner.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub owner_id: Uuid,
    pub file: StoredFile,
    pub alt_text: Option<String>,
    pub sort_order: Option<i32>,
    pub is_featured: bool,
    pub viewport: Option<Viewport>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub alt_text: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub is_featured: Option<bool>,
    pub file: Option<StoredFile>,
    pub viewport: Option<Option<Viewport>>,
}

impl AssetPatch {
    pub fn featured(is_featured: bool) -> Self {
        Self {
            is_featured: Some(is_featured),
            ..Default::default()
        }
    }

    pub fn sort_order(sort_order: i32) -> Self {
        Self {
            sort_order: Some(sort_order),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.alt_text.is_none()
            && self.sort_order.is_none()
            && self.is_featured.is_none()
            && self.file.is_none()
            && self.viewport.is_none()
    }

    /// Apply to an in-memory asset, as a store would.
    pub fn apply_to(self, asset: &mut Asset) {
        if let Some(alt_text) = self.alt_text {
            asset.alt_text = alt_text;
        }
        if let Some(sort_order) = self.sort_order {
            asset.sort_order = sort_order;
        }
        if let Some(is_featured) = self.is_featured {
            asset.is_featured = is_featured;
        }
        if let Some(file) = self.file {
            asset.storage_path = file.storage_path;
            asset.url = file.url;
            asset.file_size = file.file_size;
            asset.width = file.width;
            asset.height = file.height;
            asset.mime_type = file.mime_type;
        }
        if let Some(viewport) = self.viewport {
            asset.viewport = viewport;
        }
    }
}
