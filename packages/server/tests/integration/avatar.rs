use serde_json::{Value, json};
use uuid::Uuid;

use crate::common::{TestApp, jpeg, routes};

fn assert_close(value: &Value, expected: f64) {
    let actual = value.as_f64().expect("expected a number");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn crop_fields<'a>(rect: [&'a str; 6]) -> [(&'static str, &'a str); 6] {
    [
        ("displayed_width", rect[0]),
        ("displayed_height", rect[1]),
        ("crop_x", rect[2]),
        ("crop_y", rect[3]),
        ("crop_width", rect[4]),
        ("crop_height", rect[5]),
    ]
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_with_crop_stores_normalized_viewport() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();

        // Original 100x200 shown at 50x100; a 10x10 box at (10, 20).
        let res = app
            .upload(
                &routes::avatars(owner),
                jpeg(100, 200),
                &crop_fields(["50", "100", "10", "20", "10", "10"]),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let path = res.body["storage_path"].as_str().unwrap();
        assert!(path.starts_with(&format!("{owner}/avatar-")));
        assert!(res.body["url"]
            .as_str()
            .unwrap()
            .starts_with("http://media.test/user-avatars/"));
        assert_eq!(res.body["width"].as_u64().unwrap(), 16);
        assert_eq!(res.body["height"].as_u64().unwrap(), 32);

        let viewport = &res.body["viewport"];
        assert_close(&viewport["x"], 0.3);
        assert_close(&viewport["y"], 0.25);
        assert_close(&viewport["size"], 0.1);
    }

    #[tokio::test]
    async fn avatars_are_never_auto_featured() {
        let app = TestApp::spawn().await;
        let res = app
            .upload(&routes::avatars(Uuid::now_v7()), jpeg(20, 20), &[])
            .await;
        assert_eq!(res.status, 201);
        assert!(!res.body["is_featured"].as_bool().unwrap());
        assert!(res.body["viewport"].is_null());
    }

    #[tokio::test]
    async fn partial_crop_is_rejected() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();

        let res = app
            .upload(
                &routes::avatars(owner),
                jpeg(20, 20),
                &[("displayed_width", "20"), ("crop_x", "0")],
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        let list = app.get(&routes::avatars(owner)).await;
        assert_eq!(list.body["total"].as_u64().unwrap(), 0);
    }

    #[tokio::test]
    async fn degenerate_display_size_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .upload(
                &routes::avatars(Uuid::now_v7()),
                jpeg(20, 20),
                &crop_fields(["0", "20", "0", "0", "5", "5"]),
            )
            .await;
        assert_eq!(res.status, 400);
    }
}

mod edit {
    use super::*;

    async fn create_avatar(app: &TestApp, owner: Uuid) -> String {
        let res = app
            .upload(
                &routes::avatars(owner),
                jpeg(100, 200),
                &crop_fields(["50", "100", "10", "20", "10", "10"]),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        res.id()
    }

    #[tokio::test]
    async fn patch_crop_recomputes_and_clears_viewport() {
        let app = TestApp::spawn().await;
        let id = create_avatar(&app, Uuid::now_v7()).await;

        // Stored image is 16x32; shown at 160x320 with a 160x160 box at (0, 0).
        let crop = json!({
            "displayed_width": 160.0, "displayed_height": 320.0,
            "crop_x": 0.0, "crop_y": 0.0, "crop_width": 160.0, "crop_height": 160.0
        });
        let res = app.patch(&routes::avatar(&id), &json!({ "crop": crop })).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_close(&res.body["viewport"]["x"], 0.5);
        assert_close(&res.body["viewport"]["y"], 0.25);
        assert_close(&res.body["viewport"]["size"], 0.5);

        let res = app.patch(&routes::avatar(&id), &json!({ "crop": null })).await;
        assert_eq!(res.status, 200);
        assert!(res.body["viewport"].is_null());
    }

    #[tokio::test]
    async fn patch_alt_text_keeps_viewport() {
        let app = TestApp::spawn().await;
        let id = create_avatar(&app, Uuid::now_v7()).await;

        let res = app
            .patch(&routes::avatar(&id), &json!({ "alt_text": "  Profile  " }))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["alt_text"].as_str().unwrap(), "Profile");
        assert_close(&res.body["viewport"]["x"], 0.3);
    }

    #[tokio::test]
    async fn replace_clears_viewport() {
        let app = TestApp::spawn().await;
        let id = create_avatar(&app, Uuid::now_v7()).await;

        let res = app.replace(&routes::avatar_file(&id), jpeg(30, 30), &[]).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.id(), id);
        assert!(res.body["viewport"].is_null());
        assert_eq!(res.body["width"].as_u64().unwrap(), 30);
    }

    #[tokio::test]
    async fn set_featured_and_delete() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let a = create_avatar(&app, owner).await;
        let b = create_avatar(&app, owner).await;

        let res = app.post(&routes::avatar_featured(&b)).await;
        assert_eq!(res.status, 200);
        assert!(res.body["is_featured"].as_bool().unwrap());

        assert_eq!(app.delete(&routes::avatar(&b)).await.status, 204);

        // Avatars have no promotion on delete.
        let list = app.get(&routes::avatars(owner)).await;
        let assets = list.body["assets"].as_array().unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0]["id"].as_str().unwrap(), a);
        assert!(!assets[0]["is_featured"].as_bool().unwrap());
    }

    #[tokio::test]
    async fn reorder_and_reconcile_avatars() {
        let app = TestApp::spawn().await;
        let owner = Uuid::now_v7();
        let a = create_avatar(&app, owner).await;
        let b = create_avatar(&app, owner).await;

        let res = app
            .put(&routes::avatars_reorder(owner), &json!({ "asset_ids": [b, a] }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let listed: Vec<&str> = res.body["assets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|x| x["id"].as_str().unwrap())
            .collect();
        assert_eq!(listed, vec![b.as_str(), a.as_str()]);

        let res = app
            .put(&routes::avatars_reorder(owner), &json!({ "asset_ids": [a] }))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "INVALID_REORDER");

        // Avatars never gain a featured flag from reconcile.
        let res = app.post(&routes::avatars_reconcile(owner)).await;
        assert_eq!(res.status, 200);
        let assets = res.body["assets"].as_array().unwrap();
        assert_eq!(assets[0]["id"].as_str().unwrap(), b);
        assert!(assets.iter().all(|x| !x["is_featured"].as_bool().unwrap()));
        let orders: Vec<i64> = assets.iter().map(|x| x["sort_order"].as_i64().unwrap()).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[tokio::test]
    async fn unknown_avatar_is_not_found() {
        let app = TestApp::spawn().await;
        let id = Uuid::now_v7().to_string();

        let res = app.get(&routes::avatar(&id)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");

        let res = app.patch(&routes::avatar(&id), &json!({ "alt_text": "x" })).await;
        assert_eq!(res.status, 404);

        let res = app.replace(&routes::avatar_file(&id), jpeg(8, 8), &[]).await;
        assert_eq!(res.status, 404);
    }
}
