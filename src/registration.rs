// ABOUTME: OAuth 1.0a signed user registration and deregistration against the provider
// ABOUTME: Registration is idempotent; an already-registered user is reported, not raised
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::bearer_client::transport_error;
use crate::oauth1::{OAuth1Signer, SigningMode, TokenCredentials};
use pierre_wellness_core::{SyncError, SyncResult};
use reqwest::{header, Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

/// Result of a registration call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// The provider created the registration
    Registered,
    /// The provider already had this user registered
    AlreadyRegistered,
}

/// Registration endpoint and how it is signed
#[derive(Debug, Clone)]
pub struct SignedEndpoint {
    /// Absolute endpoint URL
    pub url: String,
    /// Credentials the signature covers
    pub mode: SigningMode,
}

/// Client for the OAuth 1.0a registration endpoint
#[derive(Debug, Clone)]
pub struct RegistrationClient {
    client: Client,
    signer: OAuth1Signer,
    endpoint: SignedEndpoint,
}

impl RegistrationClient {
    /// Create a client signing with `signer`
    #[must_use]
    pub const fn new(client: Client, signer: OAuth1Signer, endpoint: SignedEndpoint) -> Self {
        Self {
            client,
            signer,
            endpoint,
        }
    }

    /// Register `external_user_id` with the provider
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` when a three-legged endpoint gets no token,
    /// `Transport` when no response arrives, and `ProviderRejected` for any non-2xx
    /// status other than 409
    pub async fn register_user(
        &self,
        external_user_id: &str,
        token: Option<&TokenCredentials>,
    ) -> SyncResult<RegistrationOutcome> {
        let body = json!({ "userId": external_user_id });
        let (status, text) = self.send(Method::POST, Some(&body), token).await?;

        if status.is_success() {
            info!(user.external_id = %external_user_id, "Provider registration created");
            Ok(RegistrationOutcome::Registered)
        } else if status == StatusCode::CONFLICT {
            info!(user.external_id = %external_user_id, "Provider registration already exists");
            Ok(RegistrationOutcome::AlreadyRegistered)
        } else {
            warn!(
                user.external_id = %external_user_id,
                http.status = status.as_u16(),
                "Provider registration rejected"
            );
            Err(SyncError::ProviderRejected {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    /// Remove the registration; a registration that no longer exists is success
    ///
    /// # Errors
    ///
    /// Same as [`Self::register_user`], with 404 treated as success
    pub async fn deregister_user(&self, token: Option<&TokenCredentials>) -> SyncResult<()> {
        let (status, text) = self.send(Method::DELETE, None, token).await?;
        if status.is_success() || status == StatusCode::NOT_FOUND {
            info!(http.status = status.as_u16(), "Provider registration removed");
            Ok(())
        } else {
            Err(SyncError::ProviderRejected {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    async fn send(
        &self,
        method: Method,
        body: Option<&serde_json::Value>,
        token: Option<&TokenCredentials>,
    ) -> SyncResult<(StatusCode, String)> {
        let token = match (self.endpoint.mode, token) {
            (SigningMode::TwoLegged, _) => None,
            (SigningMode::ThreeLegged, Some(token)) => Some(token),
            (SigningMode::ThreeLegged, None) => {
                return Err(SyncError::missing_credential(
                    "OAuth 1.0a token for three-legged registration",
                ))
            }
        };

        let authorization = self
            .signer
            .sign(method.as_str(), &self.endpoint.url, &[], token)?;

        let mut request = self
            .client
            .request(method, &self.endpoint.url)
            .header(header::AUTHORIZATION, authorization)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(&e))?;
        Ok((status, text))
    }
}
