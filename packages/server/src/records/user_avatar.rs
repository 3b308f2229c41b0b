use chrono::Utc;
use common::storage::ObjectPath;
use common::viewport::Viewport;
use sea_orm::*;
use uuid::Uuid;

use super::table::{self, AssetTable};
use super::{RecordError, from_db_dim, from_db_int, to_db_dim, to_db_int};
use crate::entity::user_avatar;
use crate::pipeline::model::{Asset, AssetPatch, NewAsset};

impl AssetTable for user_avatar::Entity {
    fn id_column() -> user_avatar::Column {
        user_avatar::Column::Id
    }

    fn owner_column() -> user_avatar::Column {
        user_avatar::Column::UserId
    }

    fn sort_order_column() -> user_avatar::Column {
        user_avatar::Column::SortOrder
    }

    fn created_at_column() -> user_avatar::Column {
        user_avatar::Column::CreatedAt
    }
}

pub(super) async fn insert(db: &DatabaseConnection, new: NewAsset) -> Result<Asset, RecordError> {
    let sort_order =
        table::sort_order_for::<user_avatar::Entity>(db, new.owner_id, new.sort_order).await?;
    let now = Utc::now();
    let (viewport_x, viewport_y, viewport_size) = split_viewport(new.viewport);

    let model = user_avatar::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(new.owner_id),
        storage_path: Set(new.file.storage_path.to_string()),
        url: Set(new.file.url),
        alt_text: Set(new.alt_text),
        sort_order: Set(sort_order),
        is_featured: Set(new.is_featured),
        file_size: Set(to_db_int(new.file.file_size, "file_size")?),
        width: Set(to_db_dim(new.file.width, "width")?),
        height: Set(to_db_dim(new.file.height, "height")?),
        mime_type: Set(new.file.mime_type),
        viewport_x: Set(viewport_x),
        viewport_y: Set(viewport_y),
        viewport_size: Set(viewport_size),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    to_asset(model)
}

pub(super) async fn get(db: &DatabaseConnection, id: Uuid) -> Result<Asset, RecordError> {
    table::find_row::<user_avatar::Entity>(db, id)
        .await
        .and_then(to_asset)
}

pub(super) async fn list_by_owner(
    db: &DatabaseConnection,
    owner_id: Uuid,
) -> Result<Vec<Asset>, RecordError> {
    table::owned_rows::<user_avatar::Entity>(db, owner_id)
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
    let existing = table::find_row::<user_avatar::Entity>(db, id).await?;
    let mut active: user_avatar::ActiveModel = existing.into();
    if let Some(viewport) = patch.viewport {
        let (x, y, size) = split_viewport(viewport);
        active.viewport_x = Set(x);
        active.viewport_y = Set(y);
        active.viewport_size = Set(size);
    }
    apply_shared_patch!(active, patch);

    to_asset(active.update(db).await?)
}

pub(super) async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<bool, RecordError> {
    table::delete_row::<user_avatar::Entity>(db, id).await
}

fn split_viewport(viewport: Option<Viewport>) -> (Option<f64>, Option<f64>, Option<f64>) {
    match viewport {
        Some(v) => (Some(v.x), Some(v.y), Some(v.size)),
        None => (None, None, None),
    }
}

fn to_asset(m: user_avatar::Model) -> Result<Asset, RecordError> {
    // A partially written viewport reads as no crop.
    let viewport = match (m.viewport_x, m.viewport_y, m.viewport_size) {
        (Some(x), Some(y), Some(size)) => Some(Viewport { x, y, size }),
        _ => None,
    };

    Ok(Asset {
        id: m.id,
        owner_id: m.user_id,
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
        viewport,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}
