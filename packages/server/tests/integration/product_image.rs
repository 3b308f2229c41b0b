use serde_json::json;
use uuid::Uuid;

use crate::common::{MAX_UPLOAD, TestApp, jpeg, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_compresses_and_features_first_image() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();

        let res = app
            .upload(
                &routes::product_images(owner),
                jpeg(256, 128),
                &[("alt_text", "Sapphire ring")],
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["owner_id"].as_str().unwrap(), owner.to_string());
        assert_eq!(res.body["width"].as_u64().unwrap(), 64);
        assert_eq!(res.body["height"].as_u64().unwrap(), 32);
        assert_eq!(res.body["mime_type"].as_str().unwrap(), "image/jpeg");
        assert_eq!(res.body["alt_text"].as_str().unwrap(), "Sapphire ring");
        assert_eq!(res.body["sort_order"].as_i64().unwrap(), 0);
        assert!(res.body["is_featured"].as_bool().unwrap());

        let path = res.body["storage_path"].as_str().unwrap();
        assert!(path.starts_with(&format!("{owner}/original/")));
        assert!(path.ends_with(".jpg"));
        assert_eq!(
            res.body["url"].as_str().unwrap(),
            format!("http://media.test/product-images/{path}")
        );
        assert!(app.blob_root.path().join("product-images").join(path).exists());
    }

    #[tokio::test]
    async fn second_image_is_not_featured_unless_requested() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let first = app.create_product_image(owner).await;
        let second = app.create_product_image(owner).await;
        assert_eq!(app.featured_ids(owner).await, vec![first.clone()]);

        let res = app
            .upload(
                &routes::product_images(owner),
                jpeg(16, 16),
                &[("is_featured", "true")],
            )
            .await;
        assert_eq!(res.status, 201);
        let third = res.id();

        assert_eq!(app.featured_ids(owner).await, vec![third.clone()]);
        assert_eq!(app.product_image_ids(owner).await, vec![first, second, third]);
    }

    #[tokio::test]
    async fn upload_at_taken_position_shifts_later_images() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let a = app.create_product_image(owner).await;
        let b = app.create_product_image(owner).await;

        let res = app
            .upload(
                &routes::product_images(owner),
                jpeg(16, 16),
                &[("sort_order", "0")],
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let inserted = res.id();

        let list = app.get(&routes::product_images(owner)).await;
        let orders: Vec<i64> = list.body["assets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|x| x["sort_order"].as_i64().unwrap())
            .collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(app.product_image_ids(owner).await, vec![inserted, a, b]);
    }

    #[tokio::test]
    async fn upload_without_compression_keeps_dimensions() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();

        let res = app
            .upload(
                &routes::product_images(owner),
                jpeg(200, 100),
                &[("compress", "false")],
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["width"].as_u64().unwrap(), 200);
        assert_eq!(res.body["height"].as_u64().unwrap(), 100);
    }

    #[tokio::test]
    async fn rejects_non_image() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();

        let res = app
            .upload(&routes::product_images(owner), b"PDF-1.7".to_vec(), &[])
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.code(), "UNPROCESSABLE_IMAGE");
        assert!(app.product_image_ids(owner).await.is_empty());
    }

    #[tokio::test]
    async fn rejects_empty_file() {
        let app = TestApp::spawn().await;
        let res = app
            .upload(&routes::product_images(Uuid::now_v7()), Vec::new(), &[])
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let app = TestApp::spawn().await;
        let res = app
            .upload(
                &routes::product_images(Uuid::now_v7()),
                vec![0u8; MAX_UPLOAD as usize + 1],
                &[],
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_missing_file_field() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new().text("alt_text", "No file");
        let res = app
            .client
            .post(app.url(&routes::product_images(Uuid::now_v7())))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn rejects_invalid_flags_and_crop() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();

        let res = app
            .upload(
                &routes::product_images(owner),
                jpeg(8, 8),
                &[("sort_order", "first")],
            )
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .upload(
                &routes::product_images(owner),
                jpeg(8, 8),
                &[("sort_order", "-1")],
            )
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .upload(
                &routes::product_images(owner),
                jpeg(8, 8),
                &[("sort_order", "2147483647")],
            )
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .upload(
                &routes::product_images(owner),
                jpeg(8, 8),
                &[
                    ("displayed_width", "8"),
                    ("displayed_height", "8"),
                    ("crop_x", "0"),
                    ("crop_y", "0"),
                    ("crop_width", "4"),
                    ("crop_height", "4"),
                ],
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(app.product_image_ids(owner).await.is_empty());
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deleting_featured_promotes_next() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let a = app.create_product_image(owner).await;
        let b = app.create_product_image(owner).await;
        let c = app.create_product_image(owner).await;

        let res = app.delete(&routes::product_image(&a)).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.product_image_ids(owner).await, vec![b.clone(), c]);
        assert_eq!(app.featured_ids(owner).await, vec![b]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let a = app.create_product_image(owner).await;
        app.create_product_image(owner).await;

        assert_eq!(app.delete(&routes::product_image(&a)).await.status, 204);
        assert_eq!(app.delete(&routes::product_image(&a)).await.status, 204);
        assert_eq!(app.product_image_ids(owner).await.len(), 1);

        let res = app.get(&routes::product_image(&a)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_removes_blob() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let id = app.create_product_image(owner).await;
        let res = app.get(&routes::product_image(&id)).await;
        let path = res.body["storage_path"].as_str().unwrap().to_string();
        let file = app.blob_root.path().join("product-images").join(&path);
        assert!(file.exists());

        app.delete(&routes::product_image(&id)).await;
        assert!(!file.exists());
    }
}

mod reorder {
    use super::*;

    #[tokio::test]
    async fn reorder_applies_new_order() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let a = app.create_product_image(owner).await;
        let b = app.create_product_image(owner).await;
        let c = app.create_product_image(owner).await;

        let res = app
            .put(
                &routes::product_images_reorder(owner),
                &json!({ "asset_ids": [c, a, b] }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total"].as_u64().unwrap(), 3);
        assert_eq!(app.product_image_ids(owner).await, vec![c, a, b]);
    }

    #[tokio::test]
    async fn reorder_rejects_non_permutation() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let a = app.create_product_image(owner).await;
        let b = app.create_product_image(owner).await;
        let foreign = Uuid::now_v7().to_string();

        for ids in [
            json!([a]),
            json!([a, b, foreign]),
            json!([a, a]),
        ] {
            let res = app
                .put(&routes::product_images_reorder(owner), &json!({ "asset_ids": ids }))
                .await;
            assert_eq!(res.status, 400);
            assert_eq!(res.code(), "INVALID_REORDER");
        }

        assert_eq!(app.product_image_ids(owner).await, vec![a, b]);
    }

    #[tokio::test]
    async fn reorder_rejects_malformed_body() {
        let app = TestApp::spawn().await;
        let res = app
            .put(
                &routes::product_images_reorder(Uuid::now_v7()),
                &json!({ "asset_ids": "nope" }),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn reconcile_is_a_no_op_on_consistent_set() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let a = app.create_product_image(owner).await;
        let b = app.create_product_image(owner).await;

        let res = app.post(&routes::product_images_reconcile(owner)).await;
        assert_eq!(res.status, 200);
        let orders: Vec<i64> = res.body["assets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|x| x["sort_order"].as_i64().unwrap())
            .collect();
        assert_eq!(orders, vec![0, 1]);
        assert_eq!(app.product_image_ids(owner).await, vec![a.clone(), b]);
        assert_eq!(app.featured_ids(owner).await, vec![a]);
    }
}

mod edit {
    use super::*;

    #[tokio::test]
    async fn set_featured_moves_flag() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        app.create_product_image(owner).await;
        let b = app.create_product_image(owner).await;

        let res = app.post(&routes::product_image_featured(&b)).await;
        assert_eq!(res.status, 200);
        assert!(res.body["is_featured"].as_bool().unwrap());
        assert_eq!(app.featured_ids(owner).await, vec![b]);
    }

    #[tokio::test]
    async fn set_featured_on_missing_image_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .post(&routes::product_image_featured(&Uuid::now_v7().to_string()))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn patch_alt_text() {
        let app = TestApp::spawn().await;
        let id = app.create_product_image(Uuid::now_v7()).await;

        let res = app
            .patch(&routes::product_image(&id), &json!({ "alt_text": "Diamond stud" }))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["alt_text"].as_str().unwrap(), "Diamond stud");

        let res = app.patch(&routes::product_image(&id), &json!({})).await;
        assert_eq!(res.body["alt_text"].as_str().unwrap(), "Diamond stud");

        let res = app
            .patch(&routes::product_image(&id), &json!({ "alt_text": null }))
            .await;
        assert!(res.body["alt_text"].is_null());

        let res = app
            .patch(&routes::product_image(&id), &json!({ "alt_text": "x".repeat(501) }))
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn patch_crop_on_product_image_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_product_image(Uuid::now_v7()).await;
        let crop = json!({
            "displayed_width": 10.0, "displayed_height": 10.0,
            "crop_x": 0.0, "crop_y": 0.0, "crop_width": 5.0, "crop_height": 5.0
        });
        let res = app
            .patch(&routes::product_image(&id), &json!({ "crop": crop }))
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn replace_file_keeps_identity() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let res = app
            .upload(
                &routes::product_images(owner),
                jpeg(16, 16),
                &[("alt_text", "Brooch")],
            )
            .await;
        let id = res.id();
        let old_path = res.body["storage_path"].as_str().unwrap().to_string();

        let res = app
            .replace(&routes::product_image_file(&id), jpeg(48, 24), &[])
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.id(), id);
        assert_eq!(res.body["alt_text"].as_str().unwrap(), "Brooch");
        assert!(res.body["is_featured"].as_bool().unwrap());
        assert_eq!(res.body["width"].as_u64().unwrap(), 48);
        let new_path = res.body["storage_path"].as_str().unwrap();
        assert_ne!(new_path, old_path);

        let bucket = app.blob_root.path().join("product-images");
        assert!(bucket.join(new_path).exists());
        assert!(!bucket.join(&old_path).exists());
    }

    #[tokio::test]
    async fn replace_with_garbage_leaves_image_untouched() {
        let app = TestApp::spawn().await;
        let id = app.create_product_image(Uuid::now_v7()).await;
        let before = app.get(&routes::product_image(&id)).await.body;

        let res = app
            .replace(&routes::product_image_file(&id), b"garbage".to_vec(), &[])
            .await;
        assert_eq!(res.status, 422);

        let after = app.get(&routes::product_image(&id)).await.body;
        assert_eq!(before, after);
    }
}

mod docs {
    use super::*;

    #[tokio::test]
    async fn openapi_lists_asset_routes() {
        let app = TestApp::spawn().await;
        let res = app.get("/api-docs/openapi.json").await;
        assert_eq!(res.status, 200);
        let paths = res.body["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/v1/products/{owner_id}/images"));
        assert!(paths.contains_key("/api/v1/product-images/{asset_id}/featured"));
        assert!(paths.contains_key("/api/v1/users/{owner_id}/avatars"));
    }
}
