// ABOUTME: Library entry point for the Pierre wellness sync client
// ABOUTME: OAuth 1.0a signing, OAuth 2.0 PKCE lifecycle, and windowed historical backfill
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Wellness Sync
//!
//! Client for wellness APIs that run two OAuth generations side by side: legacy
//! endpoints signed with OAuth 1.0a HMAC-SHA1 and data endpoints authorized with
//! OAuth 2.0 bearer tokens obtained through PKCE.
//!
//! ## Architecture
//!
//! - **oauth1**: request signing and header verification
//! - **pkce**: verifier, challenge and state generation
//! - **bearer_client**: single bearer calls and range-limited window fetches
//! - **lifecycle**: authorization, code exchange, single-flight refresh, revocation
//! - **backfill**: windowed historical import with retry and partial results
//! - **store**: injected persistence for tokens, records and pending authorizations
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pierre_wellness_sync::config::{BackfillConfig, ProviderConfig};
//! use pierre_wellness_sync::backfill::BackfillOrchestrator;
//! use pierre_wellness_sync::lifecycle::TokenLifecycleManager;
//! use pierre_wellness_sync::store::{InMemoryPendingAuthStore, InMemoryWellnessStore};
//! use pierre_wellness_sync::http_client::shared_client;
//!
//! # async fn run() -> pierre_wellness_core::SyncResult<()> {
//! let store = Arc::new(InMemoryWellnessStore::new());
//! let lifecycle = Arc::new(
//!     TokenLifecycleManager::new(
//!         store.clone(),
//!         Arc::new(InMemoryPendingAuthStore::new()),
//!         shared_client().clone(),
//!     )
//!     .with_provider(ProviderConfig::garmin_from_env()?),
//! );
//! let start = lifecycle.begin_authorization("garmin").await?;
//! println!("state {}", start.state());
//!
//! let orchestrator = BackfillOrchestrator::new(lifecycle, store, BackfillConfig::from_env());
//! # let _ = orchestrator;
//! # Ok(())
//! # }
//! ```

/// Windowed historical backfill
pub mod backfill;

/// Bearer-authenticated data client
pub mod bearer_client;

/// Environment-driven configuration
pub mod config;

/// Shared HTTP client
pub mod http_client;

/// Token lifecycle management
pub mod lifecycle;

/// Structured logging setup
pub mod logging;

/// OAuth 1.0a request signing
pub mod oauth1;

/// PKCE and state generation
pub mod pkce;

/// Signed user registration
pub mod registration;

/// Retry policy for windowed requests
pub mod retry;

/// Storage collaborators
pub mod store;

/// Range validation and window splitting
pub mod windows;

pub use backfill::BackfillOrchestrator;
pub use lifecycle::{AuthorizationStart, TokenLifecycleManager};
pub use oauth1::OAuth1Signer;
pub use pierre_wellness_core::{
    AccessTokenRecord, AggregateResult, ConnectionState, SyncError, SyncResult, TimeWindow,
};
