// ABOUTME: Environment-driven configuration for provider endpoints, HTTP timeouts, and backfill
// ABOUTME: Loads Garmin OAuth 2.0 and OAuth 1.0a credentials and logs secret fingerprints only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::oauth1::{ConsumerCredentials, SigningMode};
use crate::retry::RetryPolicy;
use pierre_wellness_core::constants::{garmin, http, oauth_providers, retry};
use pierre_wellness_core::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

/// Which authorization protocol `begin_authorization` drives for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProtocol {
    /// OAuth 2.0 authorization code flow with PKCE (S256)
    OAuth2Pkce,
    /// OAuth 1.0a two-legged registration, no user redirect
    OAuth1Registration,
}

/// Endpoints, credentials and limits for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name used as the store key
    pub name: String,
    /// Protocol used to link a user
    pub protocol: AuthProtocol,
    /// OAuth 2.0 client id
    pub client_id: String,
    /// OAuth 2.0 client secret
    pub client_secret: String,
    /// OAuth 2.0 redirect URI registered with the provider
    pub redirect_uri: String,
    /// Consent page
    pub auth_url: String,
    /// Token endpoint for code exchange and refresh
    pub token_url: String,
    /// Base URL for bearer data calls
    pub api_base_url: String,
    /// Token revocation endpoint, if the provider has one
    pub revoke_url: Option<String>,
    /// OAuth 1.0a registration endpoint
    pub registration_url: Option<String>,
    /// How the registration endpoint is signed
    pub registration_signing: SigningMode,
    /// OAuth 1.0a consumer pair
    pub consumer: Option<ConsumerCredentials>,
    /// Scopes requested on the consent page
    pub scopes: Vec<String>,
    /// Longest range a single windowed request may cover
    pub max_range_seconds: i64,
}

impl ProviderConfig {
    /// Garmin configuration with production endpoints and the given OAuth 2.0 client
    #[must_use]
    pub fn garmin(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self {
            name: oauth_providers::GARMIN.to_owned(),
            protocol: AuthProtocol::OAuth2Pkce,
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
            redirect_uri: redirect_uri.to_owned(),
            auth_url: garmin::AUTH_URL.to_owned(),
            token_url: garmin::TOKEN_URL.to_owned(),
            api_base_url: garmin::API_BASE_URL.to_owned(),
            revoke_url: None,
            registration_url: Some(garmin::REGISTRATION_URL.to_owned()),
            registration_signing: SigningMode::TwoLegged,
            consumer: Some(ConsumerCredentials {
                consumer_key: client_id.to_owned(),
                consumer_secret: client_secret.to_owned(),
            }),
            scopes: parse_scopes(garmin::DEFAULT_SCOPES),
            max_range_seconds: garmin::MAX_RANGE_SECONDS,
        }
    }

    /// Load Garmin configuration from environment
    ///
    /// # Errors
    ///
    /// Returns `Config` when `GARMIN_CLIENT_ID` or `GARMIN_CLIENT_SECRET` is unset, or
    /// when `GARMIN_MAX_RANGE_SECONDS` is not a positive integer
    pub fn garmin_from_env() -> SyncResult<Self> {
        let client_id = required("GARMIN_CLIENT_ID")?;
        let client_secret = required("GARMIN_CLIENT_SECRET")?;
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8081".to_owned());
        let redirect_uri = env::var("GARMIN_REDIRECT_URI")
            .unwrap_or_else(|_| format!("{base_url}/api/oauth/callback/garmin"));

        let mut config = Self::garmin(&client_id, &client_secret, &redirect_uri);

        if let Ok(url) = env::var("GARMIN_AUTH_URL") {
            config.auth_url = url;
        }
        if let Ok(url) = env::var("GARMIN_TOKEN_URL") {
            config.token_url = url;
        }
        if let Ok(url) = env::var("GARMIN_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = env::var("GARMIN_REGISTRATION_URL") {
            config.registration_url = Some(url);
        }
        config.revoke_url = env::var("GARMIN_REVOKE_URL").ok();

        if let (Ok(consumer_key), Ok(consumer_secret)) = (
            env::var("GARMIN_CONSUMER_KEY"),
            env::var("GARMIN_CONSUMER_SECRET"),
        ) {
            config.consumer = Some(ConsumerCredentials {
                consumer_key,
                consumer_secret,
            });
        }

        if let Ok(raw) = env::var("GARMIN_MAX_RANGE_SECONDS") {
            config.max_range_seconds = raw
                .parse::<i64>()
                .ok()
                .filter(|seconds| *seconds > 0)
                .ok_or_else(|| {
                    SyncError::Config(format!(
                        "GARMIN_MAX_RANGE_SECONDS must be a positive integer, got {raw}"
                    ))
                })?;
        }

        Ok(config)
    }

    /// SHA-256 fingerprint of the client secret (first 8 hex chars), safe to log
    #[must_use]
    pub fn secret_fingerprint(&self) -> String {
        fingerprint(&self.client_secret)
    }

    /// Validate credentials and log diagnostics without revealing secrets
    ///
    /// Returns true if the credentials appear usable.
    pub fn validate_and_log(&self) -> bool {
        let provider_name = &self.name;
        if self.client_id.is_empty() {
            warn!("OAuth provider {provider_name}: client_id is missing or empty");
            return false;
        }
        if self.client_secret.is_empty() {
            warn!("OAuth provider {provider_name}: client_secret is missing or empty");
            return false;
        }

        info!(
            "OAuth provider {provider_name}: client_id={}, secret_length={}, secret_fingerprint={}, max_range_seconds={}",
            self.client_id,
            self.client_secret.len(),
            self.secret_fingerprint(),
            self.max_range_seconds
        );

        if let Some(consumer) = &self.consumer {
            if consumer.consumer_key.is_empty() || consumer.consumer_secret.is_empty() {
                warn!("OAuth provider {provider_name}: OAuth 1.0a consumer pair is incomplete");
                return false;
            }
        }

        if self.client_secret.len() < 20 {
            warn!(
                "OAuth provider {provider_name}: client_secret is unusually short ({} chars) - \
                 this may indicate a configuration error",
                self.client_secret.len()
            );
            return false;
        }
        true
    }
}

/// Timeouts applied to every provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(http::DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(http::DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl HttpClientConfig {
    /// Load from `HTTP_TIMEOUT_SECS` and `HTTP_CONNECT_TIMEOUT_SECS`
    #[must_use]
    pub fn from_env() -> Self {
        let parse_secs = |key: &str, default: u64| {
            Duration::from_secs(
                env::var(key)
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default),
            )
        };
        Self {
            timeout: parse_secs("HTTP_TIMEOUT_SECS", http::DEFAULT_TIMEOUT_SECS),
            connect_timeout: parse_secs(
                "HTTP_CONNECT_TIMEOUT_SECS",
                http::DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
        }
    }
}

/// Backfill orchestration settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    /// Resource path (relative to the API base) pulled per window
    pub resource: String,
    /// Windows in flight at once for one user (1 or 2)
    pub window_concurrency: usize,
    /// Retry policy for transient window failures
    pub retry: RetryPolicy,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            resource: garmin::DEFAULT_BACKFILL_RESOURCE.to_owned(),
            window_concurrency: 1,
            retry: RetryPolicy::default(),
        }
    }
}

impl BackfillConfig {
    /// Load from `BACKFILL_*` variables; concurrency is clamped to 1..=2
    #[must_use]
    pub fn from_env() -> Self {
        let window_concurrency = env::var("BACKFILL_WINDOW_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        Self {
            resource: env::var("BACKFILL_RESOURCE")
                .unwrap_or_else(|_| garmin::DEFAULT_BACKFILL_RESOURCE.to_owned()),
            window_concurrency: clamp_concurrency(window_concurrency),
            retry: RetryPolicy::from_env(),
        }
    }

    /// Override the concurrency, clamped to 1..=2
    #[must_use]
    pub fn with_window_concurrency(mut self, window_concurrency: usize) -> Self {
        self.window_concurrency = clamp_concurrency(window_concurrency);
        self
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Everything the CLI needs, loaded in one place
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Garmin provider
    pub garmin: ProviderConfig,
    /// HTTP timeouts
    pub http: HttpClientConfig,
    /// Backfill settings
    pub backfill: BackfillConfig,
}

impl SyncConfig {
    /// Load the full configuration from environment
    ///
    /// # Errors
    ///
    /// Returns `Config` when required provider credentials are missing
    pub fn from_env() -> SyncResult<Self> {
        Ok(Self {
            garmin: ProviderConfig::garmin_from_env()?,
            http: HttpClientConfig::from_env(),
            backfill: BackfillConfig::from_env(),
        })
    }
}

fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(1, retry::MAX_WINDOW_CONCURRENCY)
}

fn required(key: &str) -> SyncResult<String> {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SyncError::Config(format!("{key} is not set")))
}

fn parse_scopes(scopes: &str) -> Vec<String> {
    scopes
        .split(',')
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_owned)
        .collect()
}

fn fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    hex::encode(digest).chars().take(8).collect()
}
