// ABOUTME: Core types and constants for the Pierre wellness sync client
// ABOUTME: Foundation crate with error handling, token and window models, and provider constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Wellness Core
//!
//! Foundation crate shared by the wellness sync client. It changes rarely, so the
//! signing, lifecycle and backfill code in the root crate can be rebuilt without
//! touching these types.
//!
//! ## Modules
//!
//! - **errors**: `SyncError` taxonomy and the `SyncResult` alias
//! - **models**: access token records, connection states, time windows, aggregate results
//! - **constants**: provider identifiers, Garmin endpoints and request limits

/// Sync error taxonomy shared by every component
pub mod errors;

/// Token, window and backfill result models
pub mod models;

/// Provider identifiers, endpoints and limits
pub mod constants;

pub use errors::{SyncError, SyncResult};
pub use models::{
    AccessTokenRecord, AggregateResult, ConnectionState, ConnectionStatus, FailedWindow,
    TimeWindow, WellnessRecord,
};
