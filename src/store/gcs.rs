//! Google Cloud Storage client
//!
//! Downloads objects through the JSON API media endpoint:
//! `{endpoint}/storage/v1/b/{bucket}/o/{object}?alt=media`.
//! Works against the real service or a local emulator.
//!
//! Requests carry a configured bearer token, or one fetched from the
//! compute metadata server when metadata credentials are enabled.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};

use super::auth::MetadataTokenSource;
use super::error::{StoreError, StoreResult};
use super::retry::RetryPolicy;
use super::ObjectStore;

/// Public GCS endpoint
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Configuration for the GCS client
#[derive(Debug, Clone)]
pub struct GcsConfig {
    /// Bucket name
    pub bucket: String,
    /// API endpoint, without trailing slash
    pub endpoint: String,
    /// Optional OAuth bearer token
    pub bearer_token: Option<String>,
    /// Metadata server to request tokens from when no bearer token is set
    pub metadata_host: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Retry policy for transient failures
    pub retry: RetryPolicy,
}

impl GcsConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            bearer_token: None,
            metadata_host: None,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn metadata_credentials(mut self, host: Option<String>) -> Self {
        self.metadata_host = host.filter(|h| !h.trim().is_empty());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Object store backed by Google Cloud Storage
pub struct GcsStore {
    client: Client,
    config: GcsConfig,
    tokens: Option<MetadataTokenSource>,
}

impl GcsStore {
    /// Create a client. Fails if the bucket is blank or the HTTP client cannot be built.
    pub fn new(config: GcsConfig) -> StoreResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StoreError::Configuration(
                "bucket name must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StoreError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        let tokens = match (&config.bearer_token, &config.metadata_host) {
            (None, Some(host)) => Some(MetadataTokenSource::new(client.clone(), host.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &GcsConfig {
        &self.config
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.config.endpoint,
            urlencoding::encode(&self.config.bucket),
            urlencoding::encode(key.trim_start_matches('/'))
        )
    }

    async fn fetch_once(&self, key: &str) -> StoreResult<Vec<u8>> {
        let token = match (&self.config.bearer_token, &self.tokens) {
            (Some(token), _) => Some(token.clone()),
            (None, Some(tokens)) => Some(tokens.token().await?),
            (None, None) => None,
        };

        let mut request = self.client.get(self.object_url(key));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            if let Some(tokens) = &self.tokens {
                tokens.invalidate().await;
            }
        }

        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(bytes.to_vec());
        }

        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                bucket: self.config.bucket.clone(),
                key: key.to_string(),
            });
        }

        let message = response.text().await.unwrap_or_default();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(StoreError::TransientIo(format!("{}: {}", status, message)))
        } else {
            Err(StoreError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    fn bucket(&self) -> &str {
        &self.config.bucket
    }

    fn describe(&self) -> String {
        match &self.tokens {
            Some(tokens) => format!(
                "gcs {} (bucket {}, metadata credentials from {})",
                self.config.endpoint,
                self.config.bucket,
                tokens.host()
            ),
            None => format!("gcs {} (bucket {})", self.config.endpoint, self.config.bucket),
        }
    }

    async fn fetch(&self, key: &str) -> StoreResult<Vec<u8>> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let started = Instant::now();

            match self.fetch_once(key).await {
                Ok(bytes) => {
                    tracing::debug!(
                        bucket = %self.config.bucket,
                        key = %key,
                        bytes = bytes.len(),
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Downloaded object"
                    );
                    return Ok(bytes);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        bucket = %self.config.bucket,
                        key = %key,
                        attempt,
                        error = %e,
                        "Download failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
