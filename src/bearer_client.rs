// ABOUTME: OAuth 2.0 bearer-authenticated client for wellness data endpoints
// ABOUTME: Returns raw status and body without retrying and enforces per-request range limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::windows;
use pierre_wellness_core::constants::query_params;
use pierre_wellness_core::{SyncError, SyncResult, TimeWindow};
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Status and body of a provider response, success or not
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl RawResponse {
    /// 2xx status
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Deserialize the body as JSON
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` if the body is not the expected JSON shape
    pub fn json<T: DeserializeOwned>(&self) -> SyncResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            SyncError::InvalidResponse(format!("Failed to parse provider response: {e}"))
        })
    }
}

/// Map a reqwest failure to a transient transport error
pub(crate) fn transport_error(error: &reqwest::Error) -> SyncError {
    SyncError::Transport {
        message: error.to_string(),
        timed_out: error.is_timeout(),
    }
}

/// Bearer client bound to one provider's API base
#[derive(Debug, Clone)]
pub struct BearerClient {
    client: Client,
    api_base_url: String,
    max_range_seconds: i64,
}

impl BearerClient {
    /// Create a client for `api_base_url` enforcing `max_range_seconds` per window
    #[must_use]
    pub fn new(client: Client, api_base_url: &str, max_range_seconds: i64) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_owned(),
            max_range_seconds,
        }
    }

    /// Longest range one windowed request may cover
    #[must_use]
    pub const fn max_range_seconds(&self) -> i64 {
        self.max_range_seconds
    }

    /// Issue one bearer-authenticated request
    ///
    /// Non-2xx statuses are returned, not raised. No retry happens here.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` for an empty token and `Transport` when no response
    /// arrives (including timeouts)
    pub async fn request(
        &self,
        path: &str,
        method: Method,
        access_token: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> SyncResult<RawResponse> {
        if access_token.is_empty() {
            return Err(SyncError::missing_credential("OAuth 2.0 access token"));
        }

        let url = format!("{}/{}", self.api_base_url, path.trim_start_matches('/'));
        debug!(http.method = %method, http.url = %url, "Provider request");

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        debug!(http.url = %url, http.status = status, "Provider response");
        Ok(RawResponse { status, body })
    }

    /// `0 < end - start <= max_range_seconds`
    #[must_use]
    pub const fn validate_range(&self, start: i64, end: i64) -> bool {
        windows::validate_range(start, end, self.max_range_seconds)
    }

    /// Split `[start, end)` into windows this client can request
    ///
    /// # Errors
    ///
    /// Returns `RangeInvalid` when `end <= start`
    pub fn split_range(&self, start: i64, end: i64) -> SyncResult<Vec<TimeWindow>> {
        windows::split_range(start, end, self.max_range_seconds)
    }

    /// Fetch one window of `resource` by upload time
    ///
    /// # Errors
    ///
    /// Returns `RangeInvalid` before any network call if the window is too long, plus
    /// the errors of [`Self::request`]
    pub async fn fetch_window(
        &self,
        resource: &str,
        access_token: &str,
        window: TimeWindow,
    ) -> SyncResult<RawResponse> {
        windows::ensure_valid_window(window, self.max_range_seconds)?;
        let query = [
            (query_params::UPLOAD_START, window.start.to_string()),
            (query_params::UPLOAD_END, window.end.to_string()),
        ];
        self.request(resource, Method::GET, access_token, &query, None)
            .await
    }
}
