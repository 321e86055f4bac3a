// ABOUTME: Shared HTTP client with connection pooling for provider API calls
// ABOUTME: Every request is bounded by the configured request and connect timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::HttpClientConfig;
use pierre_wellness_core::{SyncError, SyncResult};
use reqwest::{Client, ClientBuilder};
use std::sync::OnceLock;
use tracing::warn;

/// Configured timeouts for the shared client
static CLIENT_CONFIG: OnceLock<HttpClientConfig> = OnceLock::new();

/// Global shared HTTP client
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Record the timeouts the shared client is built with
///
/// Must be called before the first `shared_client()` call to take effect; later
/// calls are ignored.
pub fn initialize_shared_client(config: HttpClientConfig) {
    let _ = CLIENT_CONFIG.set(config);
}

/// Build a dedicated client with the given timeouts
///
/// # Errors
///
/// Returns `Config` if the TLS backend cannot be initialized
pub fn build_client(config: &HttpClientConfig) -> SyncResult<Client> {
    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Shared client for provider calls, created on first use
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let config = CLIENT_CONFIG.get().copied().unwrap_or_default();
        client_with_fallback(&config, build_client)
    })
}

/// Build with `config`, falling back to the default timeouts if that fails
///
/// A client without timeouts is only used when the default configuration cannot
/// be built either.
pub fn client_with_fallback<F>(config: &HttpClientConfig, build: F) -> Client
where
    F: Fn(&HttpClientConfig) -> SyncResult<Client>,
{
    match build(config) {
        Ok(client) => client,
        Err(e) => {
            warn!(
                http.timeout_ms = config.timeout.as_millis() as u64,
                "Configured HTTP client unavailable, using default timeouts: {e}"
            );
            build(&HttpClientConfig::default()).unwrap_or_else(|e| {
                warn!("Default HTTP client unavailable, requests have no timeout: {e}");
                Client::new()
            })
        }
    }
}
