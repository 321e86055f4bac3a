// ABOUTME: Unified error taxonomy for signing, PKCE, token lifecycle, and backfill operations
// ABOUTME: Classifies failures as transient, re-authorization, or caller errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Sync Error Types
//!
//! Signing and PKCE errors are local and fatal to the current call. Lifecycle
//! errors carry enough detail for the caller to decide whether the user has to
//! re-authorize. Backfill errors are partial: only `AuthorizationError` aborts a
//! run, and it carries whatever was collected before the abort.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{AggregateResult, FailedWindow, TimeWindow};

/// Errors raised by the wellness sync client
#[derive(Debug, Error)]
pub enum SyncError {
    /// No token, key or secret was supplied (caller bug, not retried)
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Callback state does not match the state issued for the attempt
    #[error("OAuth state parameter does not match the authorization attempt")]
    StateMismatch,

    /// PKCE verifier was lost between redirect and callback
    #[error("PKCE code verifier is not available for this authorization attempt")]
    MissingVerifier,

    /// No usable refresh path; the user has to authorize again
    #[error("Re-authorization required for user {user_id} on {provider}")]
    ReauthorizationRequired {
        /// Internal user id
        user_id: Uuid,
        /// Provider name
        provider: String,
    },

    /// Refresh token rejected or refresh call failed
    #[error("Token refresh failed for {provider}: {message}")]
    RefreshFailed {
        /// Provider name
        provider: String,
        /// HTTP status returned by the token endpoint, if any
        status: Option<u16>,
        /// Failure detail
        message: String,
    },

    /// 401/403 during a backfill that a single refresh could not cure
    #[error("Backfill aborted by authorization failure: {reason}")]
    AuthorizationError {
        /// Status of the rejected window call, if the provider answered
        status: Option<u16>,
        /// Failure detail
        reason: String,
        /// Windows and records collected before the abort
        partial: Box<AggregateResult>,
    },

    /// Window failed after its retry budget was exhausted
    #[error("Window {}..{} failed after {attempts} attempt(s): {reason}", .window.start, .window.end)]
    WindowFailed {
        /// The failed window
        window: TimeWindow,
        /// Last HTTP status, if a response was received
        status: Option<u16>,
        /// Attempts made
        attempts: u32,
        /// Failure detail
        reason: String,
    },

    /// Requested range violates provider limits
    #[error("Invalid range {start}..{end} (maximum {max_range_seconds}s per request)")]
    RangeInvalid {
        /// Range start, epoch seconds
        start: i64,
        /// Range end, epoch seconds
        end: i64,
        /// Provider limit
        max_range_seconds: i64,
    },

    /// Provider is not configured
    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),

    /// Malformed caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network failure or timeout before a response arrived
    #[error("Transport error: {message}")]
    Transport {
        /// Failure detail
        message: String,
        /// Whether the request timed out
        timed_out: bool,
    },

    /// Provider answered with an unexpected payload
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Provider answered a non-window call with a non-success status
    #[error("Provider rejected request with status {status}: {body}")]
    ProviderRejected {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },

    /// Store collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Create a missing credential error
    #[must_use]
    pub fn missing_credential(what: impl Into<String>) -> Self {
        Self::MissingCredential(what.into())
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a storage error
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a re-authorization error
    #[must_use]
    pub fn reauthorization_required(user_id: Uuid, provider: impl Into<String>) -> Self {
        Self::ReauthorizationRequired {
            user_id,
            provider: provider.into(),
        }
    }

    /// Whether retrying the same call later may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::ProviderRejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the end user has to go through authorization again
    #[must_use]
    pub const fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            Self::ReauthorizationRequired { .. }
                | Self::RefreshFailed { .. }
                | Self::StateMismatch
                | Self::MissingVerifier
                | Self::AuthorizationError { .. }
        )
    }
}

impl From<FailedWindow> for SyncError {
    fn from(failed: FailedWindow) -> Self {
        Self::WindowFailed {
            window: failed.window,
            status: failed.status,
            attempts: failed.attempts,
            reason: failed.reason,
        }
    }
}

/// Result alias used across the sync client
pub type SyncResult<T> = Result<T, SyncError>;
