//! Pre-signed URLs for proposal attachments.
//!
//! [`S3Presigner`] drives the AWS SDK presigner with static credentials. The
//! URLs are signed locally in SigV4 query-string form; no call is made to the
//! object store.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::{PresignedRequest, PresigningConfig};
use aws_sdk_s3::Client;
use log::debug;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, PhtError, PhtResult};
use crate::services::clock::Clock;

/// SigV4 caps query-string signatures at seven days.
pub const MAX_EXPIRY: Duration = Duration::from_secs(7 * 24 * 3600);
const MAX_KEY_LEN: usize = 1024;
const CREDENTIALS_PROVIDER: &str = "pht_static";

/// HTTP method a URL is signed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignedMethod {
    Get,
    Put,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
    pub method: SignedMethod,
    pub expires_in: u64,
}

/// Issues time-limited URLs for attachment upload and download.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn sign_upload(&self, key: &str, expiry: Duration) -> PhtResult<PresignedUrl>;
    async fn sign_download(&self, key: &str, expiry: Duration) -> PhtResult<PresignedUrl>;
}

/// Credentials and addressing for one bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    /// Base URL of an S3-compatible service, path prefix included; AWS
    /// regional endpoint when unset.
    pub endpoint: Option<String>,
    /// Address the bucket in the path instead of the host name.
    pub path_style: bool,
}

pub struct S3Presigner {
    client: Client,
    bucket: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for S3Presigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Presigner")
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl S3Presigner {
    /// Build an SDK client from static credentials. Signing times come from
    /// `clock`.
    pub async fn new(settings: S3Settings, clock: Arc<dyn Clock>) -> PhtResult<Self> {
        if settings.bucket.is_empty() || settings.region.is_empty() {
            return Err(PhtError::configuration("S3 bucket and region must be set"));
        }
        if settings.access_key_id.is_empty() || settings.secret_access_key.is_empty() {
            return Err(PhtError::configuration("S3 credentials must be set"));
        }
        if let Some(endpoint) = &settings.endpoint {
            Url::parse(endpoint).map_err(|e| {
                PhtError::configuration(format!("Invalid S3 endpoint '{}': {}", endpoint, e))
            })?;
        }

        let creds = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            settings.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER,
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(creds);

        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(settings.path_style)
            .build();

        debug!(
            "S3 presigner for bucket '{}' in {} (path style: {})",
            settings.bucket, settings.region, settings.path_style
        );
        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: settings.bucket,
            clock,
        })
    }

    fn presigning_config(&self, key: &str, expiry: Duration) -> PhtResult<PresigningConfig> {
        validate_key(key)?;
        if expiry.is_zero() || expiry > MAX_EXPIRY {
            return Err(PhtError::validation_with_context(
                format!("Expiry must be between 1 and {} seconds", MAX_EXPIRY.as_secs()),
                ErrorContext::new("presign").with_entity("attachment").with_entity_id(key),
            ));
        }
        PresigningConfig::builder()
            .start_time(SystemTime::from(self.clock.now()))
            .expires_in(expiry)
            .build()
            .map_err(|e| presign_error("presigning_config", key, e))
    }
}

#[async_trait]
impl ObjectStore for S3Presigner {
    async fn sign_upload(&self, key: &str, expiry: Duration) -> PhtResult<PresignedUrl> {
        let config = self.presigning_config(key, expiry)?;
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| presign_error("put_object", key, e))?;
        Ok(presigned_url(request, SignedMethod::Put, expiry))
    }

    async fn sign_download(&self, key: &str, expiry: Duration) -> PhtResult<PresignedUrl> {
        let config = self.presigning_config(key, expiry)?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| presign_error("get_object", key, e))?;
        Ok(presigned_url(request, SignedMethod::Get, expiry))
    }
}

fn presigned_url(request: PresignedRequest, method: SignedMethod, expiry: Duration) -> PresignedUrl {
    PresignedUrl {
        url: request.uri().to_string(),
        method,
        expires_in: expiry.as_secs(),
    }
}

fn presign_error<E: std::error::Error>(operation: &str, key: &str, err: E) -> PhtError {
    PhtError::InternalError {
        message: format!("Failed to presign '{}'", key.escape_default()),
        context: ErrorContext::new(operation)
            .with_entity("attachment")
            .with_details(DisplayErrorContext(err).to_string()),
    }
}

fn validate_key(key: &str) -> PhtResult<()> {
    let reason = if key.trim().is_empty() {
        Some("must not be empty")
    } else if key.len() > MAX_KEY_LEN {
        Some("is longer than 1024 bytes")
    } else if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        Some("must be a relative path without '..'")
    } else if key.chars().any(char::is_control) {
        Some("contains control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(PhtError::validation_with_context(
            format!("Object key '{}' {}", key.escape_default(), reason),
            ErrorContext::new("presign").with_entity("attachment"),
        )),
        None => Ok(()),
    }
}
