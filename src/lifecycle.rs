// ABOUTME: Token lifecycle manager driving authorization, code exchange, refresh, and revocation
// ABOUTME: Owns every mutation of a stored access token record; refresh is single-flight per record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Token Lifecycle
//!
//! A connection moves through `Unlinked -> PendingAuth -> Linked -> Expired ->
//! Linked | Revoked`. The manager is the only component that writes an
//! [`AccessTokenRecord`]; every write for a `(user, provider)` pair happens while
//! holding that pair's refresh guard, so two concurrent callers never exchange the
//! same refresh token twice and never overwrite a freshly rotated token with a
//! stale copy.

use crate::bearer_client::{transport_error, BearerClient};
use crate::config::{AuthProtocol, ProviderConfig};
use crate::oauth1::{OAuth1Signer, TokenCredentials};
use crate::pkce::{self, PkceMaterial};
use crate::registration::{RegistrationClient, RegistrationOutcome, SignedEndpoint};
use crate::store::{PendingAuthStore, PendingAuthorization, WellnessStore};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use pierre_wellness_core::constants::{garmin, time};
use pierre_wellness_core::{
    AccessTokenRecord, ConnectionState, ConnectionStatus, SyncError, SyncResult,
};
use reqwest::{header, Client, Method};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// What the caller does next after starting an authorization
#[derive(Debug, Clone)]
pub enum AuthorizationStart {
    /// Send the user to the provider consent page (OAuth 2.0 + PKCE)
    Redirect {
        /// Consent page URL with PKCE challenge and state
        authorization_url: String,
        /// State issued for this attempt
        state: String,
        /// Verifier the callback has to present
        code_verifier: String,
    },
    /// Register the user through the signed OAuth 1.0a endpoint
    Registration {
        /// State issued for this attempt
        state: String,
        /// Registration endpoint
        registration_url: String,
    },
}

impl AuthorizationStart {
    /// State issued for the attempt
    #[must_use]
    pub fn state(&self) -> &str {
        match self {
            Self::Redirect { state, .. } | Self::Registration { state, .. } => state,
        }
    }
}

/// Token endpoint response for both code exchange and refresh
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderUserId {
    #[serde(rename = "userId")]
    user_id: String,
}

/// Exclusive hold on one record's guard
///
/// The map entry is dropped with the last holder, so only in-flight guards stay
/// in memory.
struct RecordLock<'a> {
    guards: &'a DashMap<(Uuid, String), Arc<Mutex<()>>>,
    key: (Uuid, String),
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordLock<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        self.guards
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Drives authorization and keeps stored tokens usable
pub struct TokenLifecycleManager {
    providers: HashMap<String, ProviderConfig>,
    store: Arc<dyn WellnessStore>,
    pending: Arc<dyn PendingAuthStore>,
    client: Client,
    refresh_skew: Duration,
    refresh_guards: DashMap<(Uuid, String), Arc<Mutex<()>>>,
}

impl TokenLifecycleManager {
    /// Create a manager with no providers configured
    #[must_use]
    pub fn new(
        store: Arc<dyn WellnessStore>,
        pending: Arc<dyn PendingAuthStore>,
        client: Client,
    ) -> Self {
        Self {
            providers: HashMap::new(),
            store,
            pending,
            client,
            refresh_skew: Duration::seconds(time::TOKEN_REFRESH_SKEW_SECS),
            refresh_guards: DashMap::new(),
        }
    }

    /// Add a provider, replacing any configuration with the same name
    #[must_use]
    pub fn with_provider(mut self, config: ProviderConfig) -> Self {
        info!("Registering provider: {}", config.name);
        self.providers.insert(config.name.clone(), config);
        self
    }

    /// Refresh tokens this long before they expire
    #[must_use]
    pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew = skew;
        self
    }

    /// Configuration of a provider
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedProvider` if the provider is not configured
    pub fn provider(&self, name: &str) -> SyncResult<&ProviderConfig> {
        self.providers
            .get(name)
            .ok_or_else(|| SyncError::UnsupportedProvider(name.to_owned()))
    }

    /// Bearer client for a provider's data API
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedProvider` if the provider is not configured
    pub fn bearer_client(&self, provider: &str) -> SyncResult<BearerClient> {
        let config = self.provider(provider)?;
        Ok(BearerClient::new(
            self.client.clone(),
            &config.api_base_url,
            config.max_range_seconds,
        ))
    }

    /// Signed client for a provider's registration endpoint
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` without a consumer pair and `Config` without a
    /// registration endpoint
    pub fn registration_client(&self, provider: &str) -> SyncResult<RegistrationClient> {
        let config = self.provider(provider)?;
        let consumer = config.consumer.clone().ok_or_else(|| {
            SyncError::missing_credential(format!("OAuth 1.0a consumer pair for {provider}"))
        })?;
        let url = registration_url(config)?;
        Ok(RegistrationClient::new(
            self.client.clone(),
            OAuth1Signer::new(consumer),
            SignedEndpoint {
                url,
                mode: config.registration_signing,
            },
        ))
    }

    /// Start linking a provider
    ///
    /// OAuth 2.0 providers get fresh PKCE material and a consent URL; OAuth 1.0a
    /// providers get a state-only pending entry and the registration target.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedProvider`, `Config` for malformed endpoints, or the
    /// pending store's error
    pub async fn begin_authorization(&self, provider: &str) -> SyncResult<AuthorizationStart> {
        let config = self.provider(provider)?;
        let state = pkce::generate_state();

        let start = match config.protocol {
            AuthProtocol::OAuth2Pkce => {
                let material = PkceMaterial::generate();
                let authorization_url = authorization_url(config, &state, &material)?;
                self.pending
                    .put(PendingAuthorization::new(
                        state.clone(),
                        provider,
                        Some(material.code_verifier.clone()),
                    ))
                    .await?;
                AuthorizationStart::Redirect {
                    authorization_url,
                    state,
                    code_verifier: material.code_verifier,
                }
            }
            AuthProtocol::OAuth1Registration => {
                let registration_url = registration_url(config)?;
                self.pending
                    .put(PendingAuthorization::new(state.clone(), provider, None))
                    .await?;
                AuthorizationStart::Registration {
                    state,
                    registration_url,
                }
            }
        };

        info!(oauth.provider = %provider, oauth.protocol = ?config.protocol, "Authorization started");
        Ok(start)
    }

    /// Exchange an authorization code for tokens and persist them
    ///
    /// The pending entry for `expected_state` is discarded whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns `StateMismatch` when the states differ, `MissingVerifier` when no
    /// verifier is supplied, `ProviderRejected`/`Transport`/`InvalidResponse` from the
    /// token endpoint, or the store's error
    pub async fn complete_authorization(
        &self,
        provider: &str,
        code: &str,
        received_state: &str,
        expected_state: &str,
        code_verifier: Option<&str>,
        user_id: Uuid,
    ) -> SyncResult<AccessTokenRecord> {
        let outcome = self
            .exchange_authorization_code(
                provider,
                code,
                received_state,
                expected_state,
                code_verifier,
                user_id,
            )
            .await;

        if let Err(e) = self.pending.remove(expected_state).await {
            warn!("Failed to discard pending authorization: {e}");
        }
        if let Err(e) = &outcome {
            warn!(user.id = %user_id, oauth.provider = %provider, "Authorization failed: {e}");
        }
        outcome
    }

    /// Complete an authorization whose state and verifier were kept in the pending store
    ///
    /// # Errors
    ///
    /// Returns `StateMismatch` when no live attempt was issued with `received_state`,
    /// plus the errors of [`Self::complete_authorization`]
    pub async fn complete_pending_authorization(
        &self,
        code: &str,
        received_state: &str,
        user_id: Uuid,
    ) -> SyncResult<AccessTokenRecord> {
        let Some(pending) = self.pending.take(received_state).await? else {
            warn!(user.id = %user_id, "Callback state does not match any live authorization attempt");
            return Err(SyncError::StateMismatch);
        };

        self.complete_authorization(
            &pending.provider,
            code,
            received_state,
            &pending.state,
            pending.code_verifier.as_deref(),
            user_id,
        )
        .await
    }

    async fn exchange_authorization_code(
        &self,
        provider: &str,
        code: &str,
        received_state: &str,
        expected_state: &str,
        code_verifier: Option<&str>,
        user_id: Uuid,
    ) -> SyncResult<AccessTokenRecord> {
        if !states_match(received_state, expected_state) {
            return Err(SyncError::StateMismatch);
        }
        let code_verifier = code_verifier
            .filter(|verifier| !verifier.is_empty())
            .ok_or(SyncError::MissingVerifier)?;
        let config = self.provider(provider)?;

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];
        let token = self.post_token_form(&config.token_url, &params).await?;
        let expires_at = expiry_from(Utc::now(), token.expires_in)?;
        let provider_user_id = self
            .resolve_provider_user_id(config, &token.access_token)
            .await;

        let _lock = self.lock_record(user_id, provider).await;

        let now = Utc::now();
        let existing = self.store.load_token(user_id, provider).await?;
        let record = AccessTokenRecord {
            user_id,
            provider: provider.to_owned(),
            access_token: token.access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
            expires_at,
            provider_user_id: provider_user_id.or_else(|| {
                existing
                    .as_ref()
                    .and_then(|record| record.provider_user_id.clone())
            }),
            scopes: token
                .scope
                .as_deref()
                .map_or_else(|| config.scopes.clone(), parse_scope),
            status: ConnectionStatus::Linked,
            connected_at: existing.as_ref().map_or(now, |record| record.connected_at),
            last_sync_at: existing.and_then(|record| record.last_sync_at),
        };
        self.store.save_token(&record).await?;

        info!(
            user.id = %user_id,
            oauth.provider = %provider,
            token.expires_at = %record.expires_at,
            "Provider linked"
        );
        Ok(record)
    }

    /// Return an access token that is not expired, refreshing it first if needed
    ///
    /// # Errors
    ///
    /// Returns `ReauthorizationRequired` when no linked record exists or an expired
    /// record cannot be refreshed, and `RefreshFailed` when the refresh call fails
    pub async fn ensure_valid_token(&self, user_id: Uuid, provider: &str) -> SyncResult<String> {
        let record = self.load_linked(user_id, provider).await?;
        let now = Utc::now();
        if !record.expires_within(now, self.refresh_skew) {
            return Ok(record.access_token);
        }
        if !record.can_refresh() {
            if record.is_expired_at(now) {
                return Err(SyncError::reauthorization_required(user_id, provider));
            }
            return Ok(record.access_token);
        }

        let _lock = self.lock_record(user_id, provider).await;

        // Re-read: another task may have refreshed while this one waited
        let record = self.load_linked(user_id, provider).await?;
        if !record.expires_within(Utc::now(), self.refresh_skew) {
            debug!(user.id = %user_id, oauth.provider = %provider, "Token already refreshed");
            return Ok(record.access_token);
        }
        Ok(self.refresh_locked(record).await?.access_token)
    }

    /// Exchange the record's refresh token for a new access token
    ///
    /// # Errors
    ///
    /// Returns `ReauthorizationRequired` without a refresh token and `RefreshFailed`
    /// when the token endpoint fails; a provider rejection also marks the record revoked
    pub async fn refresh(&self, record: AccessTokenRecord) -> SyncResult<AccessTokenRecord> {
        let _lock = self.lock_record(record.user_id, &record.provider).await;
        self.refresh_locked(record).await
    }

    /// Refresh once after the provider rejected `rejected_token`
    ///
    /// If the stored token already differs from the rejected one, another task has
    /// rotated it and that token is returned without a network call.
    ///
    /// # Errors
    ///
    /// Same as [`Self::refresh`]
    pub async fn refresh_after_rejection(
        &self,
        user_id: Uuid,
        provider: &str,
        rejected_token: &str,
    ) -> SyncResult<String> {
        let _lock = self.lock_record(user_id, provider).await;

        let record = self.load_linked(user_id, provider).await?;
        if record.access_token != rejected_token {
            debug!(user.id = %user_id, oauth.provider = %provider, "Rejected token already rotated");
            return Ok(record.access_token);
        }
        if !record.can_refresh() {
            return Err(SyncError::reauthorization_required(user_id, provider));
        }
        Ok(self.refresh_locked(record).await?.access_token)
    }

    async fn refresh_locked(&self, mut record: AccessTokenRecord) -> SyncResult<AccessTokenRecord> {
        let config = self.provider(&record.provider)?;
        let Some(refresh_token) = record.refresh_token.clone().filter(|t| !t.is_empty()) else {
            return Err(SyncError::reauthorization_required(
                record.user_id,
                &record.provider,
            ));
        };

        info!(user.id = %record.user_id, oauth.provider = %record.provider, "Refreshing access token");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ];

        match self.post_token_form(&config.token_url, &params).await {
            Ok(token) => {
                record.expires_at = expiry_from(Utc::now(), token.expires_in)?;
                record.access_token = token.access_token;
                if let Some(rotated) = token.refresh_token.filter(|t| !t.is_empty()) {
                    record.refresh_token = Some(rotated);
                }
                if let Some(scope) = token.scope.as_deref() {
                    record.scopes = parse_scope(scope);
                }
                record.status = ConnectionStatus::Linked;
                self.store.save_token(&record).await?;

                info!(
                    user.id = %record.user_id,
                    oauth.provider = %record.provider,
                    token.expires_at = %record.expires_at,
                    "Access token refreshed"
                );
                Ok(record)
            }
            Err(SyncError::ProviderRejected { status, body }) => {
                if refresh_token_rejected(status) {
                    warn!(
                        user.id = %record.user_id,
                        oauth.provider = %record.provider,
                        http.status = status,
                        "Refresh token rejected, connection revoked"
                    );
                    record.status = ConnectionStatus::Revoked;
                    self.store.save_token(&record).await?;
                } else {
                    warn!(
                        user.id = %record.user_id,
                        oauth.provider = %record.provider,
                        http.status = status,
                        "Token endpoint unavailable during refresh"
                    );
                }
                Err(SyncError::RefreshFailed {
                    provider: record.provider,
                    status: Some(status),
                    message: body,
                })
            }
            Err(e) => {
                warn!(
                    user.id = %record.user_id,
                    oauth.provider = %record.provider,
                    "Token refresh failed: {e}"
                );
                Err(SyncError::RefreshFailed {
                    provider: record.provider,
                    status: None,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Register the user with the provider's OAuth 1.0a endpoint
    ///
    /// Idempotent: an existing registration yields `AlreadyRegistered`. A pending
    /// state issued by [`Self::begin_authorization`] is consumed when supplied.
    ///
    /// # Errors
    ///
    /// Returns `StateMismatch` for an unknown `state`, plus the registration client's
    /// errors
    pub async fn register_user(
        &self,
        user_id: Uuid,
        provider: &str,
        external_user_id: &str,
        token: Option<&TokenCredentials>,
        state: Option<&str>,
    ) -> SyncResult<RegistrationOutcome> {
        if let Some(state) = state {
            if self.pending.take(state).await?.is_none() {
                return Err(SyncError::StateMismatch);
            }
        }

        let outcome = self
            .registration_client(provider)?
            .register_user(external_user_id, token)
            .await?;

        let _lock = self.lock_record(user_id, provider).await;
        if let Some(mut record) = self.store.load_token(user_id, provider).await? {
            if record.provider_user_id.is_none() {
                record.provider_user_id = Some(external_user_id.to_owned());
                self.store.save_token(&record).await?;
            }
        }

        info!(user.id = %user_id, oauth.provider = %provider, outcome = ?outcome, "User registration");
        Ok(outcome)
    }

    /// Remove the user's OAuth 1.0a registration
    ///
    /// # Errors
    ///
    /// Returns the registration client's errors
    pub async fn deregister_user(
        &self,
        user_id: Uuid,
        provider: &str,
        token: Option<&TokenCredentials>,
    ) -> SyncResult<()> {
        self.registration_client(provider)?
            .deregister_user(token)
            .await?;
        info!(user.id = %user_id, oauth.provider = %provider, "User deregistered");
        Ok(())
    }

    /// Revoke the token at the provider (best effort) and delete the local record
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedProvider` or the store's error; revocation failures are
    /// only logged
    pub async fn disconnect(&self, user_id: Uuid, provider: &str) -> SyncResult<()> {
        let config = self.provider(provider)?;

        let _lock = self.lock_record(user_id, provider).await;

        if let (Some(record), Some(revoke_url)) = (
            self.store.load_token(user_id, provider).await?,
            config.revoke_url.as_deref(),
        ) {
            if let Err(e) = self.revoke(revoke_url, &record.access_token).await {
                warn!(
                    user.id = %user_id,
                    oauth.provider = %provider,
                    "Token revocation failed, deleting local record anyway: {e}"
                );
            }
        }

        self.store.delete_token(user_id, provider).await?;
        info!(user.id = %user_id, oauth.provider = %provider, "Provider disconnected");
        Ok(())
    }

    /// Current state of a user's connection
    ///
    /// # Errors
    ///
    /// Returns the store's error
    pub async fn connection_state(
        &self,
        user_id: Uuid,
        provider: &str,
    ) -> SyncResult<ConnectionState> {
        Ok(self
            .store
            .load_token(user_id, provider)
            .await?
            .map_or(ConnectionState::Unlinked, |record| {
                record.state_at(Utc::now())
            }))
    }

    /// `PendingAuth` while an attempt issued with `state` awaits its callback
    ///
    /// # Errors
    ///
    /// Returns the pending store's error
    pub async fn pending_state(&self, state: &str) -> SyncResult<ConnectionState> {
        Ok(if self.pending.peek(state).await?.is_some() {
            ConnectionState::PendingAuth
        } else {
            ConnectionState::Unlinked
        })
    }

    /// Stamp the last successful sync on the record
    ///
    /// # Errors
    ///
    /// Returns the store's error
    pub async fn record_sync(
        &self,
        user_id: Uuid,
        provider: &str,
        at: DateTime<Utc>,
    ) -> SyncResult<()> {
        let _lock = self.lock_record(user_id, provider).await;

        if let Some(mut record) = self.store.load_token(user_id, provider).await? {
            record.last_sync_at = Some(at);
            self.store.save_token(&record).await?;
        }
        Ok(())
    }

    async fn load_linked(&self, user_id: Uuid, provider: &str) -> SyncResult<AccessTokenRecord> {
        match self.store.load_token(user_id, provider).await? {
            Some(record) if record.status == ConnectionStatus::Linked => Ok(record),
            _ => Err(SyncError::reauthorization_required(user_id, provider)),
        }
    }

    /// Number of `(user, provider)` guards currently held or awaited
    #[must_use]
    pub fn active_guard_count(&self) -> usize {
        self.refresh_guards.len()
    }

    async fn lock_record(&self, user_id: Uuid, provider: &str) -> RecordLock<'_> {
        let key = (user_id, provider.to_owned());
        let mutex = self
            .refresh_guards
            .entry(key.clone())
            .or_default()
            .value()
            .clone();
        let mut lock = RecordLock {
            guards: &self.refresh_guards,
            key,
            held: None,
        };
        lock.held = Some(mutex.lock_owned().await);
        lock
    }

    async fn resolve_provider_user_id(
        &self,
        config: &ProviderConfig,
        access_token: &str,
    ) -> Option<String> {
        let client = BearerClient::new(
            self.client.clone(),
            &config.api_base_url,
            config.max_range_seconds,
        );
        match client
            .request(garmin::USER_ID_PATH, Method::GET, access_token, &[], None)
            .await
        {
            Ok(response) if response.is_success() => match response.json::<ProviderUserId>() {
                Ok(id) => Some(id.user_id),
                Err(e) => {
                    warn!(oauth.provider = %config.name, "Unexpected user id response: {e}");
                    None
                }
            },
            Ok(response) => {
                warn!(
                    oauth.provider = %config.name,
                    http.status = response.status,
                    "Provider user id lookup failed"
                );
                None
            }
            Err(e) => {
                warn!(oauth.provider = %config.name, "Provider user id lookup failed: {e}");
                None
            }
        }
    }

    async fn post_token_form(
        &self,
        token_url: &str,
        params: &[(&str, &str)],
    ) -> SyncResult<TokenResponse> {
        let response = self
            .client
            .post(token_url)
            .header(header::ACCEPT, "application/json")
            .form(params)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        if !status.is_success() {
            return Err(SyncError::ProviderRejected {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| SyncError::InvalidResponse(format!("Failed to parse token response: {e}")))
    }

    async fn revoke(&self, revoke_url: &str, access_token: &str) -> SyncResult<()> {
        let response = self
            .client
            .post(revoke_url)
            .form(&[("token", access_token)])
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(SyncError::ProviderRejected {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

/// Consent page URL for an OAuth 2.0 + PKCE attempt
///
/// # Errors
///
/// Returns `Config` if the configured authorization URL is malformed
pub fn authorization_url(
    config: &ProviderConfig,
    state: &str,
    material: &PkceMaterial,
) -> SyncResult<String> {
    let mut url = Url::parse(&config.auth_url).map_err(|e| {
        SyncError::Config(format!(
            "Invalid authorization URL {}: {e}",
            config.auth_url
        ))
    })?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", &config.scopes.join(" "))
        .append_pair("state", state)
        .append_pair("code_challenge", &material.code_challenge)
        .append_pair("code_challenge_method", material.code_challenge_method);
    Ok(url.into())
}

fn registration_url(config: &ProviderConfig) -> SyncResult<String> {
    config
        .registration_url
        .clone()
        .ok_or_else(|| SyncError::Config(format!("{} has no registration endpoint", config.name)))
}

fn states_match(received: &str, expected: &str) -> bool {
    received.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Absolute expiry for a token endpoint's `expires_in`; negative values expire now
///
/// # Errors
///
/// Returns `InvalidResponse` when the lifetime does not fit in a `DateTime<Utc>`
pub fn expiry_from(now: DateTime<Utc>, expires_in: Option<i64>) -> SyncResult<DateTime<Utc>> {
    let seconds = expires_in
        .unwrap_or(time::DEFAULT_TOKEN_EXPIRY_SECONDS)
        .max(0);
    Duration::try_seconds(seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            SyncError::InvalidResponse(format!("Token expires_in out of range: {seconds}"))
        })
}

/// 4xx other than 429 means the refresh token itself is no longer accepted
const fn refresh_token_rejected(status: u16) -> bool {
    status >= 400 && status < 500 && status != 429
}

fn parse_scope(scope: &str) -> Vec<String> {
    scope
        .split([' ', ','])
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
