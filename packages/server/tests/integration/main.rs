mod avatar;
mod common;
mod product_image;
