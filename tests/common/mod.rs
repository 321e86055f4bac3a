// ABOUTME: Shared test utilities for the wellness sync integration tests
// ABOUTME: Mock provider configuration, seeded token records, and logging setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(
    dead_code,
    missing_docs,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]

use chrono::{DateTime, Utc};
use pierre_wellness_core::{AccessTokenRecord, ConnectionStatus};
use pierre_wellness_sync::config::{AuthProtocol, HttpClientConfig, ProviderConfig};
use pierre_wellness_sync::http_client::build_client;
use pierre_wellness_sync::lifecycle::TokenLifecycleManager;
use pierre_wellness_sync::oauth1::{ConsumerCredentials, SigningMode};
use pierre_wellness_sync::retry::RetryPolicy;
use pierre_wellness_sync::store::{InMemoryPendingAuthStore, InMemoryWellnessStore, WellnessStore};
use std::sync::{Arc, Once};
use std::time::Duration;
use uuid::Uuid;
use wiremock::MockServer;

pub const PROVIDER: &str = "garmin";
pub const TEST_CLIENT_ID: &str = "test-client-id";
pub const TEST_CLIENT_SECRET: &str = "test-client-secret-0123456789";
pub const TEST_CONSUMER_SECRET: &str = "test-consumer-secret";
pub const API_BASE_PATH: &str = "/wellness-api/rest";
pub const TOKEN_PATH: &str = "/di-oauth2-service/oauth/token";
pub const REVOKE_PATH: &str = "/di-oauth2-service/oauth/revoke";
pub const REGISTRATION_PATH: &str = "/wellness-api/rest/user/registration";

static INIT_LOGGER: Once = Once::new();

/// Quiet test logging; set `TEST_LOG=DEBUG` to see the client's logs
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Garmin configuration with every endpoint pointed at the mock server
pub fn test_provider(server: &MockServer) -> ProviderConfig {
    let base = server.uri();
    ProviderConfig {
        name: PROVIDER.to_owned(),
        protocol: AuthProtocol::OAuth2Pkce,
        client_id: TEST_CLIENT_ID.to_owned(),
        client_secret: TEST_CLIENT_SECRET.to_owned(),
        redirect_uri: "http://localhost:8081/api/oauth/callback/garmin".to_owned(),
        auth_url: format!("{base}/oauth2Confirm"),
        token_url: format!("{base}{TOKEN_PATH}"),
        api_base_url: format!("{base}{API_BASE_PATH}"),
        revoke_url: Some(format!("{base}{REVOKE_PATH}")),
        registration_url: Some(format!("{base}{REGISTRATION_PATH}")),
        registration_signing: SigningMode::TwoLegged,
        consumer: Some(ConsumerCredentials {
            consumer_key: TEST_CLIENT_ID.to_owned(),
            consumer_secret: TEST_CONSUMER_SECRET.to_owned(),
        }),
        scopes: vec!["ACTIVITY_EXPORT".to_owned(), "HEALTH_EXPORT".to_owned()],
        max_range_seconds: 86_400,
    }
}

/// Client with the production timeouts
pub fn test_http_client() -> reqwest::Client {
    build_client(&HttpClientConfig::default()).unwrap()
}

/// Retry policy with millisecond backoff so retry tests stay fast
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5))
}

/// Mock server, stores, and a lifecycle manager wired to them
pub struct TestHarness {
    pub server: MockServer,
    pub store: Arc<InMemoryWellnessStore>,
    pub pending: Arc<InMemoryPendingAuthStore>,
    pub lifecycle: Arc<TokenLifecycleManager>,
}

pub async fn harness() -> TestHarness {
    init_test_logging();
    let server = MockServer::start().await;
    harness_with_provider(server, |_| {})
}

pub fn harness_with_provider(
    server: MockServer,
    customize: impl FnOnce(&mut ProviderConfig),
) -> TestHarness {
    let mut provider = test_provider(&server);
    customize(&mut provider);
    assemble(server, provider, test_http_client(), |lifecycle| lifecycle)
}

/// Harness whose lifecycle manager uses `client` and any extra `configure` settings
pub async fn harness_with_client(
    client: reqwest::Client,
    configure: impl FnOnce(TokenLifecycleManager) -> TokenLifecycleManager,
) -> TestHarness {
    init_test_logging();
    let server = MockServer::start().await;
    let provider = test_provider(&server);
    assemble(server, provider, client, configure)
}

/// Client whose whole-request timeout is `timeout`
pub fn client_with_timeout(timeout: Duration) -> reqwest::Client {
    build_client(&HttpClientConfig {
        timeout,
        connect_timeout: Duration::from_secs(1),
    })
    .unwrap()
}

fn assemble(
    server: MockServer,
    provider: ProviderConfig,
    client: reqwest::Client,
    configure: impl FnOnce(TokenLifecycleManager) -> TokenLifecycleManager,
) -> TestHarness {
    let store = Arc::new(InMemoryWellnessStore::new());
    let pending = Arc::new(InMemoryPendingAuthStore::new());
    let lifecycle = Arc::new(configure(
        TokenLifecycleManager::new(store.clone(), pending.clone(), client).with_provider(provider),
    ));

    TestHarness {
        server,
        store,
        pending,
        lifecycle,
    }
}

/// Linked record with the given tokens and expiry
pub fn linked_record(
    user_id: Uuid,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: DateTime<Utc>,
) -> AccessTokenRecord {
    AccessTokenRecord {
        user_id,
        provider: PROVIDER.to_owned(),
        access_token: access_token.to_owned(),
        refresh_token: refresh_token.map(str::to_owned),
        expires_at,
        provider_user_id: None,
        scopes: vec!["ACTIVITY_EXPORT".to_owned()],
        status: ConnectionStatus::Linked,
        connected_at: Utc::now() - chrono::Duration::days(30),
        last_sync_at: None,
    }
}

/// Store a linked record and return its user id
pub async fn seed_record(
    store: &InMemoryWellnessStore,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Uuid {
    let user_id = Uuid::new_v4();
    store
        .save_token(&linked_record(user_id, access_token, refresh_token, expires_at))
        .await
        .unwrap();
    user_id
}

/// Token endpoint body
pub fn token_body(access_token: &str, refresh_token: &str, expires_in: i64) -> serde_json::Value {
    serde_json::json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "expires_in": expires_in,
        "token_type": "Bearer",
    })
}
