// ABOUTME: Centralized bounded exponential backoff policy for windowed provider requests
// ABOUTME: Classifies HTTP statuses into retry, abort, or record-failure decisions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use pierre_wellness_core::constants::retry;
use std::env;
use std::time::Duration;

/// What to do with a non-success response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Transient (429, 5xx, timeouts): retry the same request after backoff
    Retry,
    /// Credential rejected (401, 403): stop and let the caller re-authorize
    Abort,
    /// Permanent for this request (other 4xx): record and move on
    RecordFailure,
}

/// Bounded exponential backoff shared by every windowed fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, including the first; never more than three
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each time after
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(retry::DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(retry::DEFAULT_MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// Create a policy making between one and three attempts
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, retry::MAX_ATTEMPTS),
            initial_backoff,
            max_backoff,
        }
    }

    /// Load the policy from `BACKFILL_MAX_ATTEMPTS`, `BACKFILL_INITIAL_BACKOFF_MS`
    /// and `BACKFILL_MAX_BACKOFF_MS`
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self::new(
            env_parse("BACKFILL_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
            env_parse("BACKFILL_INITIAL_BACKOFF_MS")
                .map_or(defaults.initial_backoff, Duration::from_millis),
            env_parse("BACKFILL_MAX_BACKOFF_MS").map_or(defaults.max_backoff, Duration::from_millis),
        )
    }

    /// Classify a non-success HTTP status
    #[must_use]
    pub const fn classify(status: u16) -> RetryDecision {
        match status {
            401 | 403 => RetryDecision::Abort,
            429 | 500..=599 => RetryDecision::Retry,
            _ => RetryDecision::RecordFailure,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based)
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    /// Whether another attempt is allowed after `attempt` attempts
    #[must_use]
    pub const fn allows_another(&self, attempt: u32) -> bool {
        attempt < self.max_attempts && attempt < retry::MAX_ATTEMPTS
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}
