use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// StoredFile
///
/// A downloaded object: its MIME type and its bytes, ready to hand to the
/// response.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// StorageService
///
/// Contract for the object-storage layer. The S3 client serves production
/// and the Dockerized MinIO setup; the mock serves the tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Provisions the configured bucket when running against local MinIO.
    /// Idempotent; a no-op when the bucket already exists.
    async fn ensure_bucket_exists(&self);

    /// Generates a temporary signed URL letting a client PUT a notice image
    /// directly into the bucket, constrained to `content_type`.
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String>;

    /// Fetches a previously uploaded object by key for the download route.
    async fn download(&self, key: &str) -> Result<StoredFile, String>;
}

/// StorageState
pub type StorageState = Arc<dyn StorageService>;

/// S3StorageClient
///
/// AWS-SDK-backed implementation. `force_path_style(true)` is required for
/// MinIO-style endpoints that address buckets by path rather than subdomain.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        // Ten-minute window; long enough for an image, short enough to leak.
        let expires_in = Duration::from_secs(600);

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(expires_in).map_err(|e| e.to_string())?)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }

    async fn download(&self, key: &str) -> Result<StoredFile, String> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let content_type = output
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let body = output.body.collect().await.map_err(|e| e.to_string())?;

        Ok(StoredFile {
            content_type,
            bytes: body.into_bytes().to_vec(),
        })
    }
}

/// Strips directory-navigation segments from a client-supplied object name.
/// Download requests only ever address flat keys inside the bucket.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// In-memory implementation for tests: a key/value object map plus a switch
/// that turns every operation into a failure.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
    files: Arc<Mutex<HashMap<String, StoredFile>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Seeds an object for download tests.
    pub fn with_file(self, key: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.files.lock().unwrap().insert(
            key.to_string(),
            StoredFile {
                content_type: content_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        self
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        let sanitized_key = sanitize_key(key);

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitized_key
        ))
    }

    async fn download(&self, key: &str) -> Result<StoredFile, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        self.files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| format!("no such object: {}", key))
    }
}
