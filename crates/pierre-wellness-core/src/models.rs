// ABOUTME: Data models for access token records, connection states, and backfill windows
// ABOUTME: Defines the aggregate result a windowed backfill returns to its caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw provider payload for one summary record
pub type WellnessRecord = serde_json::Value;

/// Persisted status of an access token record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Tokens issued and usable (possibly after a refresh)
    Linked,
    /// Refresh token rejected by the provider
    Revoked,
}

/// Lifecycle state of a user's connection to a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No record stored
    Unlinked,
    /// Authorization redirect issued, callback not yet received
    PendingAuth,
    /// Access token valid
    Linked,
    /// Access token past its expiry, refresh required
    Expired,
    /// Provider rejected the refresh token
    Revoked,
}

/// OAuth 2.0 access token record for one (user, provider) pair
///
/// The store collaborator is the source of truth; copies held in memory are caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenRecord {
    /// Internal user id
    pub user_id: Uuid,
    /// Provider name
    pub provider: String,
    /// Bearer token
    pub access_token: String,
    /// Refresh token, when the provider issued one
    pub refresh_token: Option<String>,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
    /// External user id correlating pushed data to the internal user
    pub provider_user_id: Option<String>,
    /// Granted scopes
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Persisted status
    pub status: ConnectionStatus,
    /// When the user first linked the provider
    pub connected_at: DateTime<Utc>,
    /// Last successful sync
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl AccessTokenRecord {
    /// Whether the access token may no longer be used at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the access token expires within `skew` of `now`
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        now + skew >= self.expires_at
    }

    /// Whether a refresh is possible at all
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.status == ConnectionStatus::Linked
            && self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Lifecycle state derived from the stored status and expiry
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> ConnectionState {
        match self.status {
            ConnectionStatus::Revoked => ConnectionState::Revoked,
            ConnectionStatus::Linked if self.is_expired_at(now) => ConnectionState::Expired,
            ConnectionStatus::Linked => ConnectionState::Linked,
        }
    }
}

/// Half-open time range `[start, end)` in epoch seconds, one provider request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start, epoch seconds (inclusive)
    pub start: i64,
    /// Window end, epoch seconds (exclusive)
    pub end: i64,
}

impl TimeWindow {
    /// Create a window without validating it
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Window length in seconds
    #[must_use]
    pub const fn duration_secs(&self) -> i64 {
        self.end - self.start
    }

    /// Window start as a UTC timestamp
    #[must_use]
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.start, 0)
    }
}

/// A window recorded as failed after its retry budget was spent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedWindow {
    /// The window
    pub window: TimeWindow,
    /// Last HTTP status, if a response was received
    pub status: Option<u16>,
    /// Attempts made
    pub attempts: u32,
    /// Failure detail
    pub reason: String,
}

/// Outcome of a backfill run
///
/// Records are kept in chronological window order. A run with failed windows is a
/// partial success, not a hard failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Windows fetched successfully, in order
    pub complete_windows: Vec<TimeWindow>,
    /// Windows that exhausted their retry budget or failed permanently
    pub failed_windows: Vec<FailedWindow>,
    /// Combined records of every complete window
    pub records: Vec<WellnessRecord>,
    /// Run stopped early by cancellation
    pub cancelled: bool,
}

impl AggregateResult {
    /// Every requested window succeeded and the run was not cancelled
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_windows.is_empty() && !self.cancelled
    }

    /// Some data is present but the run did not fully succeed
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.is_complete() && !self.complete_windows.is_empty()
    }
}
