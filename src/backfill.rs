// ABOUTME: Windowed historical backfill orchestrator over range-limited wellness endpoints
// ABOUTME: Per-window retry, single refresh on authorization rejection, cancellation, partial results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Backfill Orchestrator
//!
//! A requested range is split into windows no longer than the provider allows and
//! fetched in chronological order. Failures are contained per window:
//!
//! - 429, 5xx and timeouts are retried with bounded exponential backoff; a window
//!   that exhausts its attempts is recorded as failed and the run continues.
//! - Other 4xx statuses and malformed bodies fail the window immediately.
//! - 401/403 triggers one token refresh and one retry of the same window. A second
//!   rejection aborts the run with the windows collected so far.
//!
//! Completed windows are handed to the store as they finish, so a run that is
//! aborted or cancelled keeps what it already fetched.

use crate::bearer_client::{BearerClient, RawResponse};
use crate::config::BackfillConfig;
use crate::lifecycle::TokenLifecycleManager;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::store::WellnessStore;
use crate::windows::date_range_to_epoch;
use chrono::{NaiveDate, Utc};
use futures_util::stream::{self, StreamExt};
use pierre_wellness_core::constants::retry::MAX_WINDOW_CONCURRENCY;
use pierre_wellness_core::{
    AggregateResult, FailedWindow, SyncError, SyncResult, TimeWindow, WellnessRecord,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of fetching one window, before it is folded into the aggregate
#[derive(Debug)]
enum WindowOutcome {
    Complete(Vec<WellnessRecord>),
    Failed(FailedWindow),
    Rejected { status: u16, access_token: String },
    TokenUnavailable(SyncError),
    Cancelled,
}

/// Why a run stopped before its last window
struct Abort {
    status: Option<u16>,
    reason: String,
}

/// Runs windowed backfills for linked users
pub struct BackfillOrchestrator {
    lifecycle: Arc<TokenLifecycleManager>,
    store: Arc<dyn WellnessStore>,
    config: BackfillConfig,
}

impl BackfillOrchestrator {
    /// Create an orchestrator; `store` receives every completed window's records
    #[must_use]
    pub fn new(
        lifecycle: Arc<TokenLifecycleManager>,
        store: Arc<dyn WellnessStore>,
        config: BackfillConfig,
    ) -> Self {
        Self {
            lifecycle,
            store,
            config,
        }
    }

    /// Backfill `[start_date, end_date)` at UTC midnight boundaries
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty date range, `ReauthorizationRequired` when
    /// no usable token exists, and `AuthorizationError` (with the partial result) when
    /// the provider keeps rejecting the token mid-run
    pub async fn backfill(
        &self,
        user_id: Uuid,
        provider: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> SyncResult<AggregateResult> {
        let (start, end) = date_range_to_epoch(start_date, end_date)?;
        self.backfill_range(user_id, provider, start, end, &CancellationToken::new())
            .await
    }

    /// Backfill `[start, end)` in epoch seconds, stopping between windows on `cancel`
    ///
    /// # Errors
    ///
    /// Same as [`Self::backfill`], plus `RangeInvalid` when `end <= start`
    pub async fn backfill_range(
        &self,
        user_id: Uuid,
        provider: &str,
        start: i64,
        end: i64,
        cancel: &CancellationToken,
    ) -> SyncResult<AggregateResult> {
        let client = self.lifecycle.bearer_client(provider)?;
        let windows = client.split_range(start, end)?;
        // Fail fast before any window is requested
        self.lifecycle.ensure_valid_token(user_id, provider).await?;

        info!(
            user.id = %user_id,
            oauth.provider = %provider,
            backfill.start = start,
            backfill.end = end,
            backfill.windows = windows.len(),
            "Backfill started"
        );

        let concurrency = self.config.window_concurrency.clamp(1, MAX_WINDOW_CONCURRENCY);
        let client = &client;
        let mut outcomes = stream::iter(windows)
            .map(move |window| async move {
                let outcome = self
                    .run_window(user_id, provider, client, window, cancel)
                    .await;
                (window, outcome)
            })
            .buffered(concurrency);

        let mut result = AggregateResult::default();
        let mut refreshed = false;

        while let Some((window, outcome)) = outcomes.next().await {
            let outcome = match outcome {
                WindowOutcome::Rejected {
                    status,
                    access_token,
                } => {
                    match self
                        .recover_rejected_window(
                            user_id,
                            provider,
                            client,
                            window,
                            status,
                            &access_token,
                            &mut refreshed,
                        )
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(abort) => return Err(self.abort(user_id, provider, result, abort)),
                    }
                }
                other => other,
            };

            match outcome {
                WindowOutcome::Complete(records) => {
                    self.absorb_complete(user_id, window, records, &mut result)
                        .await;
                }
                WindowOutcome::Failed(failed) => {
                    warn!(
                        user.id = %user_id,
                        window.start = window.start,
                        window.end = window.end,
                        http.status = ?failed.status,
                        attempts = failed.attempts,
                        "Window failed: {}",
                        failed.reason
                    );
                    result.failed_windows.push(failed);
                }
                WindowOutcome::Cancelled => {
                    info!(user.id = %user_id, window.start = window.start, "Backfill cancelled");
                    result.cancelled = true;
                    break;
                }
                WindowOutcome::TokenUnavailable(e) => {
                    let abort = Abort {
                        status: None,
                        reason: e.to_string(),
                    };
                    return Err(self.abort(user_id, provider, result, abort));
                }
                WindowOutcome::Rejected { status, .. } => {
                    let abort = Abort {
                        status: Some(status),
                        reason: format!("provider rejected the refreshed token with {status}"),
                    };
                    return Err(self.abort(user_id, provider, result, abort));
                }
            }
        }
        drop(outcomes);

        if !result.complete_windows.is_empty() {
            if let Err(e) = self.lifecycle.record_sync(user_id, provider, Utc::now()).await {
                warn!(user.id = %user_id, oauth.provider = %provider, "Failed to record sync time: {e}");
            }
        }

        info!(
            user.id = %user_id,
            oauth.provider = %provider,
            backfill.complete = result.complete_windows.len(),
            backfill.failed = result.failed_windows.len(),
            backfill.records = result.records.len(),
            backfill.cancelled = result.cancelled,
            "Backfill finished"
        );
        Ok(result)
    }

    async fn run_window(
        &self,
        user_id: Uuid,
        provider: &str,
        client: &BearerClient,
        window: TimeWindow,
        cancel: &CancellationToken,
    ) -> WindowOutcome {
        if cancel.is_cancelled() {
            return WindowOutcome::Cancelled;
        }
        match self.lifecycle.ensure_valid_token(user_id, provider).await {
            Ok(access_token) => self.fetch_with_retry(client, window, access_token).await,
            Err(e) => WindowOutcome::TokenUnavailable(e),
        }
    }

    /// One refresh and one retry for a window the provider rejected
    #[allow(clippy::too_many_arguments)]
    async fn recover_rejected_window(
        &self,
        user_id: Uuid,
        provider: &str,
        client: &BearerClient,
        window: TimeWindow,
        status: u16,
        rejected_token: &str,
        refreshed: &mut bool,
    ) -> Result<WindowOutcome, Abort> {
        let current = self
            .lifecycle
            .ensure_valid_token(user_id, provider)
            .await
            .map_err(|e| Abort {
                status: Some(status),
                reason: e.to_string(),
            })?;

        let access_token = if current != rejected_token {
            // A rotation since the rejection counts as the one refresh
            *refreshed = true;
            current
        } else if *refreshed {
            return Err(Abort {
                status: Some(status),
                reason: format!("provider rejected the refreshed token with {status}"),
            });
        } else {
            *refreshed = true;
            info!(
                user.id = %user_id,
                window.start = window.start,
                http.status = status,
                "Window rejected, refreshing token once"
            );
            self.lifecycle
                .refresh_after_rejection(user_id, provider, rejected_token)
                .await
                .map_err(|e| Abort {
                    status: Some(status),
                    reason: e.to_string(),
                })?
        };

        Ok(self.fetch_with_retry(client, window, access_token).await)
    }

    async fn fetch_with_retry(
        &self,
        client: &BearerClient,
        window: TimeWindow,
        access_token: String,
    ) -> WindowOutcome {
        let policy = &self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let (status, reason) = match client
                .fetch_window(&self.config.resource, &access_token, window)
                .await
            {
                Ok(response) if response.is_success() => {
                    return match parse_records(&response) {
                        Ok(records) => WindowOutcome::Complete(records),
                        Err(e) => failed(window, Some(response.status), attempt, e.to_string()),
                    };
                }
                Ok(response) => match RetryPolicy::classify(response.status) {
                    RetryDecision::Abort => {
                        return WindowOutcome::Rejected {
                            status: response.status,
                            access_token,
                        }
                    }
                    RetryDecision::RecordFailure => {
                        return failed(
                            window,
                            Some(response.status),
                            attempt,
                            format!("provider returned {}: {}", response.status, response.body),
                        )
                    }
                    RetryDecision::Retry => (
                        Some(response.status),
                        format!("provider returned {}", response.status),
                    ),
                },
                Err(e) if e.is_transient() => (None, e.to_string()),
                Err(e) => return failed(window, None, attempt, e.to_string()),
            };

            if !policy.allows_another(attempt) {
                return failed(window, status, attempt, reason);
            }

            let delay = policy.backoff_for(attempt);
            debug!(
                window.start = window.start,
                window.end = window.end,
                attempt,
                backoff_ms = delay.as_millis() as u64,
                "Transient window failure, retrying: {reason}"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn absorb_complete(
        &self,
        user_id: Uuid,
        window: TimeWindow,
        records: Vec<WellnessRecord>,
        result: &mut AggregateResult,
    ) {
        if !records.is_empty() {
            if let Err(e) = self.store.save_activities(user_id, &records).await {
                warn!(user.id = %user_id, window.start = window.start, "Failed to persist window: {e}");
                result.failed_windows.push(FailedWindow {
                    window,
                    status: None,
                    attempts: 1,
                    reason: e.to_string(),
                });
                return;
            }
        }

        debug!(
            user.id = %user_id,
            window.start = window.start,
            window.end = window.end,
            records = records.len(),
            "Window complete"
        );
        result.complete_windows.push(window);
        result.records.extend(records);
    }

    fn abort(
        &self,
        user_id: Uuid,
        provider: &str,
        partial: AggregateResult,
        abort: Abort,
    ) -> SyncError {
        warn!(
            user.id = %user_id,
            oauth.provider = %provider,
            http.status = ?abort.status,
            backfill.complete = partial.complete_windows.len(),
            backfill.resource = %self.config.resource,
            "Backfill aborted: {}",
            abort.reason
        );
        SyncError::AuthorizationError {
            status: abort.status,
            reason: abort.reason,
            partial: Box::new(partial),
        }
    }
}

fn failed(window: TimeWindow, status: Option<u16>, attempts: u32, reason: String) -> WindowOutcome {
    WindowOutcome::Failed(FailedWindow {
        window,
        status,
        attempts,
        reason,
    })
}

/// A 2xx body is an array of records; an empty body means no records
fn parse_records(response: &RawResponse) -> SyncResult<Vec<WellnessRecord>> {
    if response.body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match response.json::<serde_json::Value>()? {
        serde_json::Value::Array(records) => Ok(records),
        other => Err(SyncError::InvalidResponse(format!(
            "expected an array of records, got {}",
            json_kind(&other)
        ))),
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
