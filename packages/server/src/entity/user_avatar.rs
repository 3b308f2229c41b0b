use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_avatar")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub user_id: Uuid,

    #[sea_orm(unique)]
    pub storage_path: String,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub alt_text: Option<String>,

    pub sort_order: i32,
    pub is_featured: bool,

    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub mime_type: String,

    /// Normalized crop center and size on the original image.
    /// All three are set together or all NULL.
    pub viewport_x: Option<f64>,
    pub viewport_y: Option<f64>,
    pub viewport_size: Option<f64>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
