// ABOUTME: Tests for OAuth 1.0a signed user registration and deregistration
// ABOUTME: Verifies signatures on the wire, idempotent re-registration, and signing modes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use common::{
    harness, harness_with_provider, init_test_logging, seed_record, test_http_client, PROVIDER,
    REGISTRATION_PATH, TEST_CLIENT_ID, TEST_CONSUMER_SECRET,
};
use pierre_wellness_core::{ConnectionState, SyncError};
use pierre_wellness_sync::config::AuthProtocol;
use pierre_wellness_sync::lifecycle::AuthorizationStart;
use pierre_wellness_sync::oauth1::{
    self, ConsumerCredentials, OAuth1Signer, SigningMode, TokenCredentials,
};
use pierre_wellness_sync::registration::{RegistrationClient, RegistrationOutcome, SignedEndpoint};
use pierre_wellness_sync::store::WellnessStore;
use uuid::Uuid;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_register_sends_verifiable_two_legged_signature() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path(REGISTRATION_PATH))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&h.server)
        .await;

    let user_id = Uuid::new_v4();
    let outcome = h
        .lifecycle
        .register_user(user_id, PROVIDER, "garmin-user-1", None, None)
        .await
        .unwrap();
    assert_eq!(outcome, RegistrationOutcome::Registered);

    let requests = h.server.received_requests().await.unwrap();
    let request = requests.first().unwrap();
    let authorization = request
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(authorization.starts_with("OAuth "));
    assert!(!authorization.contains("oauth_token="));
    assert!(authorization.contains(&format!("oauth_consumer_key=\"{TEST_CLIENT_ID}\"")));

    let url = format!("{}{REGISTRATION_PATH}", h.server.uri());
    assert!(oauth1::verify(
        authorization,
        "POST",
        &url,
        &[],
        TEST_CONSUMER_SECRET,
        ""
    ));

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["userId"], "garmin-user-1");
}

#[tokio::test]
async fn test_registration_is_idempotent() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path(REGISTRATION_PATH))
        .respond_with(ResponseTemplate::new(201))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REGISTRATION_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate registration"))
        .mount(&h.server)
        .await;

    let user_id = Uuid::new_v4();
    let first = h
        .lifecycle
        .register_user(user_id, PROVIDER, "gu-1", None, None)
        .await
        .unwrap();
    let second = h
        .lifecycle
        .register_user(user_id, PROVIDER, "gu-1", None, None)
        .await
        .unwrap();

    assert_eq!(first, RegistrationOutcome::Registered);
    assert_eq!(second, RegistrationOutcome::AlreadyRegistered);
}

#[tokio::test]
async fn test_registration_failure_is_provider_rejected() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path(REGISTRATION_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&h.server)
        .await;

    let result = h
        .lifecycle
        .register_user(Uuid::new_v4(), PROVIDER, "gu", None, None)
        .await;
    assert!(matches!(
        result,
        Err(SyncError::ProviderRejected { status: 500, ref body }) if body == "boom"
    ));
}

#[tokio::test]
async fn test_registration_records_provider_user_id() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path(REGISTRATION_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.server)
        .await;

    let user_id = seed_record(&h.store, "t", None, Utc::now() + Duration::hours(1)).await;
    h.lifecycle
        .register_user(user_id, PROVIDER, "external-7", None, None)
        .await
        .unwrap();

    let record = h.store.load_token(user_id, PROVIDER).await.unwrap().unwrap();
    assert_eq!(record.provider_user_id.as_deref(), Some("external-7"));
}

#[tokio::test]
async fn test_oauth1_provider_starts_with_registration_state() {
    init_test_logging();
    let server = MockServer::start().await;
    let h = harness_with_provider(server, |provider| {
        provider.protocol = AuthProtocol::OAuth1Registration;
    });
    Mock::given(method("POST"))
        .and(path(REGISTRATION_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&h.server)
        .await;

    let start = h.lifecycle.begin_authorization(PROVIDER).await.unwrap();
    let AuthorizationStart::Registration {
        state,
        registration_url,
    } = start
    else {
        panic!("expected a registration start for an OAuth 1.0a provider");
    };
    assert!(registration_url.ends_with(REGISTRATION_PATH));
    assert_eq!(
        h.lifecycle.pending_state(&state).await.unwrap(),
        ConnectionState::PendingAuth
    );

    h.lifecycle
        .register_user(Uuid::new_v4(), PROVIDER, "gu", None, Some(&state))
        .await
        .unwrap();
    assert_eq!(
        h.lifecycle.pending_state(&state).await.unwrap(),
        ConnectionState::Unlinked
    );

    let unknown = h
        .lifecycle
        .register_user(Uuid::new_v4(), PROVIDER, "gu", None, Some("never-issued"))
        .await;
    assert!(matches!(unknown, Err(SyncError::StateMismatch)));
}

#[tokio::test]
async fn test_three_legged_endpoint_requires_token() {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/user/registration", server.uri());
    let client = RegistrationClient::new(
        test_http_client(),
        OAuth1Signer::new(ConsumerCredentials {
            consumer_key: "ck".to_owned(),
            consumer_secret: "cs".to_owned(),
        }),
        SignedEndpoint {
            url: url.clone(),
            mode: SigningMode::ThreeLegged,
        },
    );

    let missing = client.register_user("gu", None).await;
    assert!(matches!(missing, Err(SyncError::MissingCredential(_))));

    let token = TokenCredentials {
        token: "ut".to_owned(),
        token_secret: "us".to_owned(),
    };
    client.register_user("gu", Some(&token)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let authorization = requests[0]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(authorization.contains("oauth_token=\"ut\""));
    assert!(oauth1::verify(authorization, "POST", &url, &[], "cs", "us"));
}

#[tokio::test]
async fn test_deregister_treats_missing_registration_as_success() {
    let h = harness().await;
    Mock::given(method("DELETE"))
        .and(path(REGISTRATION_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&h.server)
        .await;

    h.lifecycle
        .deregister_user(Uuid::new_v4(), PROVIDER, None)
        .await
        .unwrap();
}
