use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use common::imaging::CompressOptions;
use image::{ImageFormat, Rgb, RgbImage};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tempfile::TempDir;
use uuid::Uuid;

use server::config::{
    AppConfig, CorsConfig, DatabaseConfig, ImagingConfig, LogConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
use server::records::{AssetRecords, MemoryAssetRecords};
use server::state::AppState;

/// Upload limit used by every test server.
pub const MAX_UPLOAD: u64 = 256 * 1024;

pub mod routes {
    use uuid::Uuid;

    pub fn product_images(owner_id: Uuid) -> String {
        format!("/api/v1/products/{owner_id}/images")
    }

    pub fn product_images_reorder(owner_id: Uuid) -> String {
        format!("/api/v1/products/{owner_id}/images/reorder")
    }

    pub fn product_images_reconcile(owner_id: Uuid) -> String {
        format!("/api/v1/products/{owner_id}/images/reconcile")
    }

    pub fn product_image(id: &str) -> String {
        format!("/api/v1/product-images/{id}")
    }

    pub fn product_image_file(id: &str) -> String {
        format!("/api/v1/product-images/{id}/file")
    }

    pub fn product_image_featured(id: &str) -> String {
        format!("/api/v1/product-images/{id}/featured")
    }

    pub fn avatars(owner_id: Uuid) -> String {
        format!("/api/v1/users/{owner_id}/avatars")
    }

    pub fn avatars_reorder(owner_id: Uuid) -> String {
        format!("/api/v1/users/{owner_id}/avatars/reorder")
    }

    pub fn avatars_reconcile(owner_id: Uuid) -> String {
        format!("/api/v1/users/{owner_id}/avatars/reconcile")
    }

    pub fn avatar(id: &str) -> String {
        format!("/api/v1/avatars/{id}")
    }

    pub fn avatar_file(id: &str) -> String {
        format!("/api/v1/avatars/{id}/file")
    }

    pub fn avatar_featured(id: &str) -> String {
        format!("/api/v1/avatars/{id}/featured")
    }
}

/// A running test server backed by in-memory records and a temp-dir blob store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub blob_root: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

fn test_config(blob_root: &TempDir) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec![],
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        storage: StorageConfig {
            backend: StorageBackend::Filesystem,
            root: blob_root.path().to_path_buf(),
            public_base_url: "http://media.test".to_string(),
            max_upload_size: MAX_UPLOAD,
            s3: None,
        },
        imaging: ImagingConfig {
            product: CompressOptions {
                max_width: 64,
                max_height: 64,
                quality: 0.8,
                max_size_bytes: None,
            },
            avatar: CompressOptions {
                max_width: 32,
                max_height: 32,
                quality: 0.85,
                max_size_bytes: None,
            },
        },
        log: LogConfig {
            level: "debug".to_string(),
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let blob_root = TempDir::new().expect("Failed to create blob directory");
        let state = AppState::open(test_config(&blob_root), |_| -> Arc<dyn AssetRecords> {
            Arc::new(MemoryAssetRecords::new())
        })
        .await
        .expect("Failed to open blob stores");

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            blob_root,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// POST a multipart form with a `file` part and extra text fields.
    pub async fn upload(&self, path: &str, file_bytes: Vec<u8>, fields: &[(&str, &str)]) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form(file_bytes, fields))
            .send()
            .await
            .expect("Failed to send multipart POST request");

        TestResponse::from_response(res).await
    }

    /// PUT a multipart form with a `file` part and extra text fields.
    pub async fn replace(&self, path: &str, file_bytes: Vec<u8>, fields: &[(&str, &str)]) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .multipart(form(file_bytes, fields))
            .send()
            .await
            .expect("Failed to send multipart PUT request");

        TestResponse::from_response(res).await
    }

    /// Upload a small JPEG product image and return its ID.
    pub async fn create_product_image(&self, owner_id: Uuid) -> String {
        let res = self
            .upload(&routes::product_images(owner_id), jpeg(16, 16), &[])
            .await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        res.id()
    }

    /// IDs of the owner's product images in display order.
    pub async fn product_image_ids(&self, owner_id: Uuid) -> Vec<String> {
        let res = self.get(&routes::product_images(owner_id)).await;
        assert_eq!(res.status, 200);
        res.body["assets"]
            .as_array()
            .expect("assets should be an array")
            .iter()
            .map(|a| a["id"].as_str().unwrap().to_string())
            .collect()
    }

    /// IDs of the owner's featured product images.
    pub async fn featured_ids(&self, owner_id: Uuid) -> Vec<String> {
        let res = self.get(&routes::product_images(owner_id)).await;
        res.body["assets"]
            .as_array()
            .expect("assets should be an array")
            .iter()
            .filter(|a| a["is_featured"].as_bool() == Some(true))
            .map(|a| a["id"].as_str().unwrap().to_string())
            .collect()
    }
}

fn form(file_bytes: Vec<u8>, fields: &[(&str, &str)]) -> Form {
    let part = Part::bytes(file_bytes)
        .file_name("upload.jpg")
        .mime_str("image/jpeg")
        .expect("Failed to set MIME type");
    fields
        .iter()
        .fold(Form::new().part("file", part), |form, (name, value)| {
            form.text(name.to_string(), value.to_string())
        })
}

/// An opaque JPEG with a gradient so it does not compress to nothing.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg)
        .expect("Failed to encode JPEG");
    out.into_inner()
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
