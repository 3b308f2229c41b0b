pub mod product_image;
pub mod user_avatar;
