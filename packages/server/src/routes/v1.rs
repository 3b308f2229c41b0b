use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::upload::upload_body_limit;
use crate::handlers::{avatar, product_image};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let max_upload = config.storage.max_upload_size;
    OpenApiRouter::new()
        .nest("/products", product_routes(max_upload))
        .nest("/product-images", product_image_routes(max_upload))
        .nest("/users", user_routes(max_upload))
        .nest("/avatars", avatar_routes(max_upload))
}

fn product_routes(max_upload: u64) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            product_image::list_product_images,
            product_image::upload_product_image
        ))
        .routes(routes!(product_image::reorder_product_images))
        .routes(routes!(product_image::reconcile_product_images))
        .layer(upload_body_limit(max_upload))
}

fn product_image_routes(max_upload: u64) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            product_image::get_product_image,
            product_image::update_product_image,
            product_image::delete_product_image
        ))
        .routes(routes!(product_image::replace_product_image_file))
        .routes(routes!(product_image::set_featured_product_image))
        .layer(upload_body_limit(max_upload))
}

fn user_routes(max_upload: u64) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(avatar::list_avatars, avatar::upload_avatar))
        .routes(routes!(avatar::reorder_avatars))
        .routes(routes!(avatar::reconcile_avatars))
        .layer(upload_body_limit(max_upload))
}

fn avatar_routes(max_upload: u64) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            avatar::get_avatar,
            avatar::update_avatar,
            avatar::delete_avatar
        ))
        .routes(routes!(avatar::replace_avatar_file))
        .routes(routes!(avatar::set_featured_avatar))
        .layer(upload_body_limit(max_upload))
}
