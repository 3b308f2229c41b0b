//! Queries shared by the per-class tables.

use sea_orm::*;
use uuid::Uuid;

use super::RecordError;

/// Columns every asset table carries under the same meaning.
pub(super) trait AssetTable: EntityTrait {
    fn id_column() -> Self::Column;
    fn owner_column() -> Self::Column;
    fn sort_order_column() -> Self::Column;
    fn created_at_column() -> Self::Column;
}

pub(super) async fn find_row<E: AssetTable>(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<E::Model, RecordError> {
    E::find()
        .filter(E::id_column().eq(id))
        .one(db)
        .await?
        .ok_or(RecordError::NotFound(id))
}

/// An owner's rows by `sort_order`, then creation time, then id.
pub(super) async fn owned_rows<E: AssetTable>(
    db: &DatabaseConnection,
    owner_id: Uuid,
) -> Result<Vec<E::Model>, RecordError> {
    Ok(E::find()
        .filter(E::owner_column().eq(owner_id))
        .order_by_asc(E::sort_order_column())
        .order_by_asc(E::created_at_column())
        .order_by_asc(E::id_column())
        .all(db)
        .await?)
}

/// The requested position, or one past the owner's current maximum.
pub(super) async fn sort_order_for<E: AssetTable>(
    db: &DatabaseConnection,
    owner_id: Uuid,
    requested: Option<i32>,
) -> Result<i32, RecordError> {
    if let Some(order) = requested {
        return Ok(order);
    }
    let max_order: Option<i32> = E::find()
        .filter(E::owner_column().eq(owner_id))
        .select_only()
        .column_as(E::sort_order_column().max(), "max_order")
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();
    max_order
        .unwrap_or(-1)
        .checked_add(1)
        .ok_or_else(|| RecordError::Corrupt("sort_order overflow".into()))
}

pub(super) async fn delete_row<E: AssetTable>(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<bool, RecordError> {
    let result = E::delete_many()
        .filter(E::id_column().eq(id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
