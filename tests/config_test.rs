// ABOUTME: Tests for provider, HTTP, and backfill configuration defaults
// ABOUTME: Environment loading, secret fingerprinting, credential validation, and concurrency clamping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use pierre_wellness_core::constants::garmin;
use pierre_wellness_core::SyncError;
use pierre_wellness_sync::config::{AuthProtocol, BackfillConfig, HttpClientConfig, ProviderConfig};
use pierre_wellness_sync::logging::LogFormat;
use pierre_wellness_sync::oauth1::SigningMode;
use pierre_wellness_sync::retry::RetryPolicy;
use serial_test::serial;
use std::env;
use std::time::Duration;

#[test]
fn test_garmin_defaults() {
    let config = ProviderConfig::garmin("id", "secret", "http://localhost/cb");
    assert_eq!(config.name, "garmin");
    assert_eq!(config.protocol, AuthProtocol::OAuth2Pkce);
    assert_eq!(config.token_url, garmin::TOKEN_URL);
    assert_eq!(config.api_base_url, garmin::API_BASE_URL);
    assert_eq!(config.max_range_seconds, 86_400);
    assert_eq!(config.registration_signing, SigningMode::TwoLegged);
    assert_eq!(config.scopes, vec!["ACTIVITY_EXPORT", "HEALTH_EXPORT"]);

    let consumer = config.consumer.unwrap();
    assert_eq!(consumer.consumer_key, "id");
    assert_eq!(consumer.consumer_secret, "secret");
}

#[test]
fn test_secret_fingerprint_hides_secret() {
    let config = ProviderConfig::garmin("id", "a-very-long-client-secret-value", "http://cb");
    let fingerprint = config.secret_fingerprint();
    assert_eq!(fingerprint.len(), 8);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(!config.client_secret.contains(&fingerprint));
    assert_eq!(
        fingerprint,
        ProviderConfig::garmin("other", "a-very-long-client-secret-value", "x").secret_fingerprint()
    );
}

#[test]
fn test_validate_and_log() {
    assert!(ProviderConfig::garmin("id", "a-very-long-client-secret-value", "cb").validate_and_log());
    assert!(!ProviderConfig::garmin("id", "short", "cb").validate_and_log());
    assert!(!ProviderConfig::garmin("", "a-very-long-client-secret-value", "cb").validate_and_log());
}

#[test]
fn test_backfill_concurrency_is_clamped() {
    let config = BackfillConfig::default();
    assert_eq!(config.window_concurrency, 1);
    assert_eq!(config.resource, "activities");
    assert_eq!(config.clone().with_window_concurrency(0).window_concurrency, 1);
    assert_eq!(config.clone().with_window_concurrency(2).window_concurrency, 2);
    assert_eq!(config.with_window_concurrency(8).window_concurrency, 2);
}

#[test]
fn test_http_defaults() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.connect_timeout, Duration::from_secs(10));
}

#[test]
fn test_log_format_parse() {
    assert_eq!(LogFormat::parse("json"), LogFormat::Json);
    assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
    assert_eq!(LogFormat::parse("anything"), LogFormat::Pretty);
}

const GARMIN_VARS: &[&str] = &[
    "GARMIN_CLIENT_ID",
    "GARMIN_CLIENT_SECRET",
    "GARMIN_REDIRECT_URI",
    "GARMIN_TOKEN_URL",
    "GARMIN_CONSUMER_KEY",
    "GARMIN_CONSUMER_SECRET",
    "GARMIN_MAX_RANGE_SECONDS",
    "BASE_URL",
];

fn clear_garmin_env() {
    for key in GARMIN_VARS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_garmin_from_env_requires_credentials() {
    clear_garmin_env();
    env::set_var("GARMIN_CLIENT_ID", "env-client");

    let result = ProviderConfig::garmin_from_env();
    assert!(matches!(result, Err(SyncError::Config(_))));
    clear_garmin_env();
}

#[test]
#[serial]
fn test_garmin_from_env_overrides() {
    clear_garmin_env();
    env::set_var("GARMIN_CLIENT_ID", "env-client");
    env::set_var("GARMIN_CLIENT_SECRET", "env-secret-0123456789abcdef");
    env::set_var("BASE_URL", "https://pierre.example.com");
    env::set_var("GARMIN_TOKEN_URL", "http://127.0.0.1:9999/token");
    env::set_var("GARMIN_CONSUMER_KEY", "legacy-key");
    env::set_var("GARMIN_CONSUMER_SECRET", "legacy-secret");
    env::set_var("GARMIN_MAX_RANGE_SECONDS", "3600");

    let config = ProviderConfig::garmin_from_env().unwrap();
    assert_eq!(config.client_id, "env-client");
    assert_eq!(
        config.redirect_uri,
        "https://pierre.example.com/api/oauth/callback/garmin"
    );
    assert_eq!(config.token_url, "http://127.0.0.1:9999/token");
    assert_eq!(config.max_range_seconds, 3600);
    assert_eq!(config.consumer.unwrap().consumer_key, "legacy-key");
    clear_garmin_env();
}

#[test]
#[serial]
fn test_garmin_from_env_rejects_bad_range() {
    clear_garmin_env();
    env::set_var("GARMIN_CLIENT_ID", "env-client");
    env::set_var("GARMIN_CLIENT_SECRET", "env-secret-0123456789abcdef");
    env::set_var("GARMIN_MAX_RANGE_SECONDS", "0");

    assert!(matches!(
        ProviderConfig::garmin_from_env(),
        Err(SyncError::Config(_))
    ));
    clear_garmin_env();
}

#[test]
#[serial]
fn test_retry_policy_from_env() {
    env::set_var("BACKFILL_MAX_ATTEMPTS", "0");
    env::set_var("BACKFILL_INITIAL_BACKOFF_MS", "250");
    env::remove_var("BACKFILL_MAX_BACKOFF_MS");

    let policy = RetryPolicy::from_env();
    assert_eq!(policy.max_attempts, 1);
    assert_eq!(policy.initial_backoff, Duration::from_millis(250));
    assert_eq!(policy.max_backoff, RetryPolicy::default().max_backoff);

    env::remove_var("BACKFILL_MAX_ATTEMPTS");
    env::remove_var("BACKFILL_INITIAL_BACKOFF_MS");
}

#[test]
#[serial]
fn test_retry_policy_from_env_caps_attempts() {
    env::set_var("BACKFILL_MAX_ATTEMPTS", "9");

    let policy = RetryPolicy::from_env();
    assert_eq!(policy.max_attempts, 3);

    env::remove_var("BACKFILL_MAX_ATTEMPTS");
}
