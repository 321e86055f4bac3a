// ABOUTME: Application constants for provider endpoints, OAuth parameters, and request limits
// ABOUTME: Garmin wellness API defaults plus retry, timeout, and PKCE bounds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// OAuth provider identifiers
pub mod oauth_providers {
    /// Garmin Connect / Garmin Health API
    pub const GARMIN: &str = "garmin";
}

/// Garmin endpoints and limits
pub mod garmin {
    /// OAuth 2.0 authorization (consent) page
    pub const AUTH_URL: &str = "https://connect.garmin.com/oauth2Confirm";
    /// OAuth 2.0 token endpoint (code exchange and refresh)
    pub const TOKEN_URL: &str = "https://diauth.garmin.com/di-oauth2-service/oauth/token";
    /// Wellness API base for bearer data calls
    pub const API_BASE_URL: &str = "https://apis.garmin.com/wellness-api/rest";
    /// User registration endpoint, signed with OAuth 1.0a
    pub const REGISTRATION_URL: &str = "https://apis.garmin.com/wellness-api/rest/user/registration";
    /// Path (relative to the API base) returning the Garmin user id
    pub const USER_ID_PATH: &str = "user/id";
    /// Default resource pulled by a backfill
    pub const DEFAULT_BACKFILL_RESOURCE: &str = "activities";
    /// Maximum upload range accepted by a single summary request
    pub const MAX_RANGE_SECONDS: i64 = 86_400;
    /// Default scopes requested on the consent page
    pub const DEFAULT_SCOPES: &str = "ACTIVITY_EXPORT,HEALTH_EXPORT";
}

/// Query parameter names used by windowed summary requests
pub mod query_params {
    /// Window start, epoch seconds
    pub const UPLOAD_START: &str = "uploadStartTimeInSeconds";
    /// Window end, epoch seconds
    pub const UPLOAD_END: &str = "uploadEndTimeInSeconds";
}

/// OAuth 1.0a signing parameters
pub mod oauth1 {
    /// Only signature method the provider accepts
    pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
    /// Protocol version sent with every request
    pub const VERSION: &str = "1.0";
    /// Random bytes in a nonce (hex encoded to 32 chars)
    pub const NONCE_BYTES: usize = 16;
}

/// PKCE (RFC 7636) bounds
pub mod pkce {
    /// Shortest verifier allowed
    pub const MIN_VERIFIER_LENGTH: usize = 43;
    /// Longest verifier allowed
    pub const MAX_VERIFIER_LENGTH: usize = 128;
    /// Verifier length used when none is requested
    pub const DEFAULT_VERIFIER_LENGTH: usize = 128;
    /// Challenge method, SHA-256
    pub const CHALLENGE_METHOD: &str = "S256";
    /// Unreserved characters a verifier is drawn from
    pub const VERIFIER_CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
}

/// Time-related constants
pub mod time {
    /// Lifetime of a pending authorization (state + verifier)
    pub const PENDING_AUTH_TTL_SECS: i64 = 600;
    /// Token lifetime assumed when the provider omits `expires_in`
    pub const DEFAULT_TOKEN_EXPIRY_SECONDS: i64 = 3600;
    /// Refresh this many seconds before the recorded expiry
    pub const TOKEN_REFRESH_SKEW_SECS: i64 = 300;
}

/// Retry defaults for windowed fetches
pub mod retry {
    /// Attempts per window, including the first
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// Hard ceiling on attempts per window
    pub const MAX_ATTEMPTS: u32 = 3;
    /// Backoff before the second attempt
    pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;
    /// Upper bound for any single backoff
    pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;
    /// Hard ceiling on concurrent windows for one user
    pub const MAX_WINDOW_CONCURRENCY: usize = 2;
}

/// HTTP client defaults
pub mod http {
    /// Whole-request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Connection timeout in seconds
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Service names for structured logging
pub mod service_names {
    /// Service name reported at startup
    pub const WELLNESS_SYNC: &str = "pierre-wellness-sync";
}
