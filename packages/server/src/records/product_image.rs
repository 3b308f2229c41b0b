use chrono::Utc;
use common::storage::ObjectPath;
use sea_orm::*;
use uuid::Uuid;

use super::table::{self, AssetTable};
use super::{RecordError, from_db_dim, from_db_int, to_db_dim, to_db_int};
use crate::entity::product_image;
use crate::pipeline::model::{Asset, AssetPatch, NewAsset};

impl AssetTable for product_image::Entity {
    fn id_column() -> product_image::Column {
        product_image::Column::Id
    }

    fn owner_column() -> product_image::Column {
        product_image::Column::ProductId
    }

    fn sort_order_column() -> product_image::Column {
        product_image::Column::SortOrder
    }

    fn created_at_column() -> product_image::Column {
        product_image::Column::CreatedAt
    }
}

pub(super) async fn insert(db: &DatabaseConnection, new: NewAsset) -> Result<Asset, RecordError> {
    let sort_order =
        table::sort_order_for::<product_image::Entity>(db, new.owner_id, new.sort_order).await?;
    let now = Utc::now();

    let model = product_image::ActiveModel {
        id: Set(Uuid::now_v7()),
        product_id: Set(new.owner_id),
        storage_path: Set(new.file.storage_path.to_string()),
        url: Set(new.file.url),
        alt_text: Set(new.alt_text),
        sort_order: Set(sort_order),
        is_featured: Set(new.is_featured),
        file_size: Set(to_db_int(new.file.file_size, "file_size")?),
        width: Set(to_db_dim(new.file.width, "width")?),
        height: Set(to_db_dim(new.file.height, "height")?),
        mime_type: Set(new.file.mime_type),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    to_asset(model)
}

pub(super) async fn get(db: &DatabaseConnection, id: Uuid) -> Result<Asset, RecordError> {
    table::find_row::<product_image::Entity>(db, id)
        .await
        .and_then(to_asset)
}

pub(super) async fn list_by_owner(
    db: &DatabaseConnection,
    owner_id: Uuid,
) -> Result<Vec<Asset>, RecordError> {
    table::owned_rows::<product_image::Entity>(db, owner_id)
        .await?
        .into_iter()
        .map(to_asset)
        .collect()
}

pub(super) async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    patch: AssetPatch,
) -> Result<Asset, RecordError> {
    let existing = table::find_row::<product_image::Entity>(db, id).await?;
    let mut active: product_image::ActiveModel = existing.into();
    apply_shared_patch!(active, patch);

    to_asset(active.update(db).await?)
}

pub(super) async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<bool, RecordError> {
    table::delete_row::<product_image::Entity>(db, id).await
}

fn to_asset(m: product_image::Model) -> Result<Asset, RecordError> {
    Ok(Asset {
        id: m.id,
        owner_id: m.product_id,
        storage_path: ObjectPath::parse(&m.storage_path)
            .map_err(|e| RecordError::Corrupt(e.to_string()))?,
        url: m.url,
        alt_text: m.alt_text,
        sort_order: m.sort_order,
        is_featured: m.is_featured,
        file_size: from_db_int(m.file_size, "file_size")?,
        width: from_db_dim(m.width, "width")?,
        height: from_db_dim(m.height, "height")?,
        mime_type: m.mime_type,
        viewport: None,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}
