use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_image")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning product.
    #[sea_orm(indexed)]
    pub product_id: Uuid,

    /// Key in the `product-images` bucket.
    #[sea_orm(unique)]
    pub storage_path: String,

    /// Derived from `storage_path`; never edited by hand.
    #[sea_orm(column_type = "Text")]
    pub url: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub alt_text: Option<String>,

    pub sort_order: i32,
    pub is_featured: bool,

    /// Describes the stored (post-compression) bytes.
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub mime_type: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
