use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{AssetRecords, RecordError};
use crate::pipeline::model::{Asset, AssetPatch, NewAsset};

/// In-process records, kept in insertion order.
#[derive(Default)]
pub struct MemoryAssetRecords {
    rows: Mutex<Vec<Asset>>,
}

impl MemoryAssetRecords {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, Vec<Asset>>, RecordError> {
        self.rows
            .lock()
            .map_err(|_| RecordError::Corrupt("record lock poisoned".into()))
    }
}

#[async_trait]
impl AssetRecords for MemoryAssetRecords {
    async fn insert(&self, new: NewAsset) -> Result<Asset, RecordError> {
        let mut rows = self.rows()?;
        let sort_order = match new.sort_order {
            Some(order) => order,
            None => rows
                .iter()
                .filter(|a| a.owner_id == new.owner_id)
                .map(|a| a.sort_order)
                .max()
                .unwrap_or(-1)
                .checked_add(1)
                .ok_or_else(|| RecordError::Corrupt("sort_order overflow".into()))?,
        };
        let now = Utc::now();
        let asset = Asset {
            id: Uuid::now_v7(),
            owner_id: new.owner_id,
            storage_path: new.file.storage_path,
            url: new.file.url,
            alt_text: new.alt_text,
            sort_order,
            is_featured: new.is_featured,
            file_size: new.file.file_size,
            width: new.file.width,
            height: new.file.height,
            mime_type: new.file.mime_type,
            viewport: new.viewport,
            created_at: now,
            updated_at: now,
        };
        rows.push(asset.clone());
        Ok(asset)
    }

    async fn get(&self, id: Uuid) -> Result<Asset, RecordError> {
        self.rows()?
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(RecordError::NotFound(id))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, RecordError> {
        let mut owned: Vec<Asset> = self
            .rows()?
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|a| a.sort_order);
        Ok(owned)
    }

    async fn update(&self, id: Uuid, patch: AssetPatch) -> Result<Asset, RecordError> {
        let mut rows = self.rows()?;
        let asset = rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RecordError::NotFound(id))?;
        patch.apply_to(asset);
        asset.updated_at = Utc::now();
        Ok(asset.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RecordError> {
        let mut rows = self.rows()?;
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() != before)
    }
}
