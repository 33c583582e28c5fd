/// Lesson media uploads via presigned object-storage URLs
///
/// The server never handles media bytes. An admin asks for a presigned `PUT`
/// URL carrying the file's checksum as object metadata, uploads directly to the
/// bucket, then asks the server to confirm that the stored object reports the
/// same checksum.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult, FieldError};

/// Object metadata key holding the client-computed checksum
pub const CHECKSUM_METADATA_KEY: &str = "checksum";

pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub key: String,
    pub content_type: String,
    pub checksum: String,
}

impl UploadRequest {
    pub fn validate(&self) -> CoreResult<()> {
        let mut errors = Vec::new();

        if self.key.trim().is_empty() {
            errors.push(FieldError::missing("key"));
        } else if self.key.starts_with('/') || self.key.split('/').any(|part| part == "..") {
            errors.push(FieldError::new("key", "must be a relative object key"));
        }
        if self.content_type.trim().is_empty() {
            errors.push(FieldError::missing("contentType"));
        }
        if self.checksum.trim().is_empty() {
            errors.push(FieldError::missing("checksum"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(errors))
        }
    }
}

#[async_trait]
pub trait UploadSigner: Send + Sync {
    /// Presigned `PUT` URL for `request.key`
    async fn presign_upload(&self, request: &UploadRequest) -> CoreResult<String>;

    /// Whether the stored object's checksum metadata equals `expected`.
    /// A missing object is `Ok(false)`.
    async fn verify_checksum(&self, key: &str, expected: &str) -> CoreResult<bool>;
}

#[derive(Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_access_key: String,
    pub url_ttl: Duration,
}

impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_access_key", &"[REDACTED]")
            .field("url_ttl", &self.url_ttl)
            .finish()
    }
}

/// [`UploadSigner`] over Amazon S3
pub struct S3UploadSigner {
    client: aws_sdk_s3::Client,
    bucket: String,
    url_ttl: Duration,
}

impl S3UploadSigner {
    pub fn new(settings: S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key,
            settings.secret_access_key,
            None,
            None,
            "coursehub-env",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region))
            .credentials_provider(credentials)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket: settings.bucket,
            url_ttl: settings.url_ttl,
        }
    }
}

#[async_trait]
impl UploadSigner for S3UploadSigner {
    async fn presign_upload(&self, request: &UploadRequest) -> CoreResult<String> {
        request.validate()?;

        let presigning = PresigningConfig::expires_in(self.url_ttl)
            .map_err(|e| CoreError::Gateway(format!("invalid presigning config: {}", e)))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&request.key)
            .content_type(&request.content_type)
            .metadata(CHECKSUM_METADATA_KEY, &request.checksum)
            .presigned(presigning)
            .await
            .map_err(|e| {
                warn!(key = %request.key, error = %e, "Failed to presign upload");
                CoreError::Gateway("failed to presign upload".to_string())
            })?;

        info!(
            key = %request.key,
            ttl_seconds = self.url_ttl.as_secs(),
            "Upload URL issued"
        );
        Ok(presigned.uri().to_string())
    }

    async fn verify_checksum(&self, key: &str, expected: &str) -> CoreResult<bool> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match head {
            Ok(output) => output,
            Err(e) if e.as_service_error().map(|se| se.is_not_found()) == Some(true) => {
                return Ok(false)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read object metadata");
                return Err(CoreError::Gateway(
                    "failed to read object metadata".to_string(),
                ));
            }
        };

        let stored = output
            .metadata()
            .and_then(|m| m.get(CHECKSUM_METADATA_KEY))
            .map(String::as_str);

        Ok(stored == Some(expected))
    }
}
