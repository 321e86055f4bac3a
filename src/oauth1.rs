// ABOUTME: OAuth 1.0a request signer producing HMAC-SHA1 Authorization headers
// ABOUTME: Canonical parameter normalization, signature base string, and header verification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # OAuth 1.0a Signer
//!
//! Legacy wellness endpoints still authenticate with RFC 5849 signatures. Signing
//! is a pure computation: the only inputs that vary per call are the nonce and the
//! timestamp, so [`OAuth1Signer::sign_with`] is deterministic and
//! [`OAuth1Signer::sign`] simply draws a fresh nonce and the current time.
//!
//! Two-legged calls sign with the consumer pair only. Three-legged calls add the
//! user's token and token secret. Which one an endpoint needs is configuration
//! ([`SigningMode`]), never inferred.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use pierre_wellness_core::constants::oauth1;
use pierre_wellness_core::{SyncError, SyncResult};
use rand::RngCore;
use ring::hmac;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use url::Url;

/// Consumer key and secret issued to the integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerCredentials {
    /// Consumer key (`oauth_consumer_key`)
    pub consumer_key: String,
    /// Consumer secret, first half of the signing key
    pub consumer_secret: String,
}

/// User-specific token pair for three-legged calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCredentials {
    /// Access token (`oauth_token`)
    pub token: String,
    /// Token secret, second half of the signing key
    pub token_secret: String,
}

/// Which credentials an endpoint is signed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningMode {
    /// Consumer key and secret only
    TwoLegged,
    /// Consumer pair plus user token and token secret
    ThreeLegged,
}

/// Percent-encode per RFC 3986, leaving only `A-Z a-z 0-9 - . _ ~` unescaped
///
/// `! ' ( ) *` are always emitted as `%21 %27 %28 %29 %2A`.
#[must_use]
pub fn percent_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Generate a 16-byte random nonce, hex encoded (32 chars)
#[must_use]
pub fn generate_nonce() -> String {
    let mut bytes = [0_u8; oauth1::NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Normalize a request URL for the base string: lowercase scheme and host,
/// default port dropped, query and fragment stripped
///
/// # Errors
///
/// Returns `InvalidInput` if the URL cannot be parsed
pub fn normalize_base_url(url: &str) -> SyncResult<String> {
    let mut parsed =
        Url::parse(url).map_err(|e| SyncError::invalid_input(format!("Invalid URL {url}: {e}")))?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}

/// Encode, sort and join parameters into the normalized parameter string
#[must_use]
pub fn normalize_parameters(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the signature base string
///
/// Query pairs already present on `url` are merged into `params`.
///
/// # Errors
///
/// Returns `InvalidInput` if the URL cannot be parsed
pub fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(String, String)],
) -> SyncResult<String> {
    let parsed =
        Url::parse(url).map_err(|e| SyncError::invalid_input(format!("Invalid URL {url}: {e}")))?;

    let mut all_params: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    all_params.extend(params.iter().cloned());

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(&normalize_base_url(url)?),
        percent_encode(&normalize_parameters(&all_params))
    ))
}

/// Build the HMAC key: `enc(consumer_secret)&enc(token_secret)`
#[must_use]
pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}

/// `base64(HMAC-SHA1(key, base_string))`
#[must_use]
pub fn compute_signature(signing_key: &str, base_string: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, signing_key.as_bytes());
    let tag = hmac::sign(&key, base_string.as_bytes());
    STANDARD.encode(tag.as_ref())
}

/// Signs requests with a fixed consumer pair
#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    credentials: ConsumerCredentials,
}

impl OAuth1Signer {
    /// Create a signer for the given consumer pair
    #[must_use]
    pub const fn new(credentials: ConsumerCredentials) -> Self {
        Self { credentials }
    }

    /// Consumer key this signer identifies as
    #[must_use]
    pub fn consumer_key(&self) -> &str {
        &self.credentials.consumer_key
    }

    /// Sign a request with a fresh nonce and the current Unix time
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if the consumer key is empty, or `InvalidInput`
    /// if the URL is malformed
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        token: Option<&TokenCredentials>,
    ) -> SyncResult<String> {
        self.sign_with(
            method,
            url,
            params,
            token,
            &generate_nonce(),
            Utc::now().timestamp(),
        )
    }

    /// Sign a request with an explicit nonce and timestamp
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if the consumer key is empty, or `InvalidInput`
    /// if the URL is malformed
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        token: Option<&TokenCredentials>,
        nonce: &str,
        timestamp: i64,
    ) -> SyncResult<String> {
        if self.credentials.consumer_key.is_empty() {
            return Err(SyncError::missing_credential("OAuth 1.0a consumer key"));
        }

        let mut oauth_params = self.oauth_params(token, nonce, timestamp);

        let mut signed_params = params.to_vec();
        signed_params.extend(oauth_params.iter().cloned());
        let base_string = signature_base_string(method, url, &signed_params)?;

        let key = signing_key(
            &self.credentials.consumer_secret,
            token.map_or("", |t| t.token_secret.as_str()),
        );
        oauth_params.push((
            "oauth_signature".to_owned(),
            compute_signature(&key, &base_string),
        ));

        Ok(authorization_header(&oauth_params))
    }

    fn oauth_params(
        &self,
        token: Option<&TokenCredentials>,
        nonce: &str,
        timestamp: i64,
    ) -> Vec<(String, String)> {
        let mut oauth_params = vec![
            (
                "oauth_consumer_key".to_owned(),
                self.credentials.consumer_key.clone(),
            ),
            ("oauth_nonce".to_owned(), nonce.to_owned()),
            (
                "oauth_signature_method".to_owned(),
                oauth1::SIGNATURE_METHOD.to_owned(),
            ),
            ("oauth_timestamp".to_owned(), timestamp.to_string()),
            ("oauth_version".to_owned(), oauth1::VERSION.to_owned()),
        ];
        if let Some(token) = token {
            oauth_params.push(("oauth_token".to_owned(), token.token.clone()));
        }
        oauth_params
    }
}

/// Assemble `OAuth k="v", ...` from oauth_* parameters sorted by key
#[must_use]
pub fn authorization_header(oauth_params: &[(String, String)]) -> String {
    let mut sorted = oauth_params.to_vec();
    sorted.sort();

    let fields = sorted
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {fields}")
}

/// Parse an `OAuth ...` header into decoded key/value pairs
///
/// # Errors
///
/// Returns `InvalidInput` if the header is not an OAuth header or a field is malformed
pub fn parse_authorization_header(header: &str) -> SyncResult<Vec<(String, String)>> {
    let fields = header
        .strip_prefix("OAuth ")
        .ok_or_else(|| SyncError::invalid_input("Authorization header is not an OAuth header"))?;

    fields
        .split(", ")
        .map(|field| {
            let (key, quoted) = field.split_once('=').ok_or_else(|| {
                SyncError::invalid_input(format!("Malformed OAuth header field: {field}"))
            })?;
            let value = quoted
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .ok_or_else(|| {
                    SyncError::invalid_input(format!("Unquoted OAuth header value: {field}"))
                })?;
            let decode = |s: &str| {
                urlencoding::decode(s)
                    .map(std::borrow::Cow::into_owned)
                    .map_err(|e| SyncError::invalid_input(format!("Bad percent-encoding: {e}")))
            };
            Ok((decode(key)?, decode(value)?))
        })
        .collect()
}

/// Recompute the signature of a produced header and compare in constant time
///
/// `params` are the request parameters that were signed alongside the header's
/// oauth_* fields.
#[must_use]
pub fn verify(
    header: &str,
    method: &str,
    url: &str,
    params: &[(String, String)],
    consumer_secret: &str,
    token_secret: &str,
) -> bool {
    let Ok(fields) = parse_authorization_header(header) else {
        return false;
    };

    let (signature, oauth_params): (Vec<_>, Vec<_>) = fields
        .into_iter()
        .partition(|(key, _)| key == "oauth_signature");
    let Some((_, received)) = signature.into_iter().next() else {
        return false;
    };

    let mut signed_params = params.to_vec();
    signed_params.extend(oauth_params);
    let Ok(base_string) = signature_base_string(method, url, &signed_params) else {
        return false;
    };
    let expected = compute_signature(&signing_key(consumer_secret, token_secret), &base_string);

    expected.as_bytes().ct_eq(received.as_bytes()).into()
}
