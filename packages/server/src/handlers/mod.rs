pub mod avatar;
pub mod media;
pub mod product_image;
pub mod upload;
