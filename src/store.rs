// ABOUTME: Storage collaborators for access token records, synced records, and pending authorizations
// ABOUTME: Async traits injected into the lifecycle manager plus in-memory implementations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Storage Collaborators
//!
//! The sync client never owns persistence. Token records and fetched summaries go
//! through [`WellnessStore`]; the state and verifier issued for an authorization
//! attempt go through [`PendingAuthStore`] until the callback consumes them.
//!
//! The in-memory implementations back the CLI and the tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pierre_wellness_core::constants::time;
use pierre_wellness_core::{AccessTokenRecord, SyncResult, WellnessRecord};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistence for token records and synced wellness data
#[async_trait]
pub trait WellnessStore: Send + Sync {
    /// Insert or replace the record for `(record.user_id, record.provider)`
    async fn save_token(&self, record: &AccessTokenRecord) -> SyncResult<()>;

    /// Load the record for a user and provider
    async fn load_token(&self, user_id: Uuid, provider: &str)
        -> SyncResult<Option<AccessTokenRecord>>;

    /// Remove the record for a user and provider; absent records are not an error
    async fn delete_token(&self, user_id: Uuid, provider: &str) -> SyncResult<()>;

    /// Persist records fetched for a user; may be called more than once for the same data
    async fn save_activities(&self, user_id: Uuid, records: &[WellnessRecord]) -> SyncResult<()>;
}

/// State and verifier issued for one authorization attempt
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    /// Opaque CSRF correlation token
    pub state: String,
    /// Provider being linked
    pub provider: String,
    /// PKCE verifier; absent for OAuth 1.0a registration attempts
    pub code_verifier: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Entry is ignored and evicted after this instant
    pub expires_at: DateTime<Utc>,
}

impl PendingAuthorization {
    /// Create an entry with the default TTL
    #[must_use]
    pub fn new(state: String, provider: &str, code_verifier: Option<String>) -> Self {
        let created_at = Utc::now();
        Self {
            state,
            provider: provider.to_owned(),
            code_verifier,
            created_at,
            expires_at: created_at + Duration::seconds(time::PENDING_AUTH_TTL_SECS),
        }
    }

    /// Whether the entry is still usable at `now`
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Short-lived storage for authorization attempts awaiting their callback
#[async_trait]
pub trait PendingAuthStore: Send + Sync {
    /// Store an entry keyed by its state
    async fn put(&self, pending: PendingAuthorization) -> SyncResult<()>;

    /// Remove and return a live entry (single use)
    async fn take(&self, state: &str) -> SyncResult<Option<PendingAuthorization>>;

    /// Return a live entry without consuming it
    async fn peek(&self, state: &str) -> SyncResult<Option<PendingAuthorization>>;

    /// Discard an entry whether or not it is live
    async fn remove(&self, state: &str) -> SyncResult<()>;
}

/// In-memory [`WellnessStore`]
#[derive(Debug, Default)]
pub struct InMemoryWellnessStore {
    tokens: RwLock<HashMap<(Uuid, String), AccessTokenRecord>>,
    activities: RwLock<HashMap<Uuid, Vec<WellnessRecord>>>,
}

impl InMemoryWellnessStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record saved for a user, in save order
    pub async fn activities(&self, user_id: Uuid) -> Vec<WellnessRecord> {
        self.activities
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl WellnessStore for InMemoryWellnessStore {
    async fn save_token(&self, record: &AccessTokenRecord) -> SyncResult<()> {
        self.tokens
            .write()
            .await
            .insert((record.user_id, record.provider.clone()), record.clone());
        Ok(())
    }

    async fn load_token(
        &self,
        user_id: Uuid,
        provider: &str,
    ) -> SyncResult<Option<AccessTokenRecord>> {
        Ok(self
            .tokens
            .read()
            .await
            .get(&(user_id, provider.to_owned()))
            .cloned())
    }

    async fn delete_token(&self, user_id: Uuid, provider: &str) -> SyncResult<()> {
        self.tokens
            .write()
            .await
            .remove(&(user_id, provider.to_owned()));
        Ok(())
    }

    async fn save_activities(&self, user_id: Uuid, records: &[WellnessRecord]) -> SyncResult<()> {
        self.activities
            .write()
            .await
            .entry(user_id)
            .or_default()
            .extend_from_slice(records);
        Ok(())
    }
}

/// In-memory [`PendingAuthStore`]; expired entries are evicted on every write
#[derive(Debug, Default)]
pub struct InMemoryPendingAuthStore {
    entries: RwLock<HashMap<String, PendingAuthorization>>,
}

impl InMemoryPendingAuthStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingAuthStore for InMemoryPendingAuthStore {
    async fn put(&self, pending: PendingAuthorization) -> SyncResult<()> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live_at(now));
        entries.insert(pending.state.clone(), pending);
        Ok(())
    }

    async fn take(&self, state: &str) -> SyncResult<Option<PendingAuthorization>> {
        let entry = self.entries.write().await.remove(state);
        Ok(entry.filter(|entry| entry.is_live_at(Utc::now())))
    }

    async fn peek(&self, state: &str) -> SyncResult<Option<PendingAuthorization>> {
        let now = Utc::now();
        Ok(self
            .entries
            .read()
            .await
            .get(state)
            .filter(|entry| entry.is_live_at(now))
            .cloned())
    }

    async fn remove(&self, state: &str) -> SyncResult<()> {
        self.entries.write().await.remove(state);
        Ok(())
    }
}
