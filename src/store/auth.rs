//! Access tokens from the compute metadata server
//!
//! On Cloud Run, GKE and GCE the attached service account hands out
//! short-lived OAuth tokens at
//! `{host}/computeMetadata/v1/instance/service-accounts/default/token`.
//! Tokens are cached and refreshed shortly before they expire.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::error::{StoreError, StoreResult};

/// Metadata server reachable from Google compute environments
pub const DEFAULT_METADATA_HOST: &str = "http://metadata.google.internal";

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh this long before the server-reported expiry
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Cached service-account token from the metadata server
pub struct MetadataTokenSource {
    client: Client,
    host: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokenSource {
    pub fn new(client: Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            cached: Mutex::new(None),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current access token, requesting a new one when the cached one is stale
    pub async fn token(&self) -> StoreResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        let fresh = self.request().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Drop the cached token so the next call asks the server again
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn request(&self) -> StoreResult<CachedToken> {
        let url = format!("{}{}", self.host, TOKEN_PATH);
        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    StoreError::Configuration(format!(
                        "no store credentials: metadata server {} is unreachable and no token is configured ({})",
                        self.host, e
                    ))
                } else {
                    StoreError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message = format!("metadata server returned {}: {}", status, message);
            return Err(if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                StoreError::TransientIo(message)
            } else {
                StoreError::Configuration(message)
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            StoreError::Configuration(format!("invalid token response from metadata server: {}", e))
        })?;

        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(REFRESH_MARGIN);
        tracing::debug!(
            host = %self.host,
            expires_in = body.expires_in,
            "Fetched access token from metadata server"
        );

        Ok(CachedToken {
            value: body.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }
}
