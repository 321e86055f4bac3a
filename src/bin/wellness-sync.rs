// ABOUTME: Operator CLI for the wellness sync client
// ABOUTME: Starts authorizations, signs OAuth 1.0a requests, previews windows, and runs backfills
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Print a consent URL with fresh PKCE material
//! wellness-sync authorize
//!
//! # Sign a two-legged registration call
//! wellness-sync sign --method POST --url https://apis.garmin.com/wellness-api/rest/user/registration
//!
//! # Show how a date range is split into request windows
//! wellness-sync windows --start-date 2025-01-01 --end-date 2025-01-04
//!
//! # Backfill with an access token obtained elsewhere
//! wellness-sync backfill --access-token TOKEN --start-date 2025-01-01 --end-date 2025-01-08
//! ```

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use pierre_wellness_core::{AccessTokenRecord, ConnectionStatus, SyncError};
use pierre_wellness_sync::backfill::BackfillOrchestrator;
use pierre_wellness_sync::config::{BackfillConfig, HttpClientConfig, ProviderConfig};
use pierre_wellness_sync::http_client::{initialize_shared_client, shared_client};
use pierre_wellness_sync::lifecycle::{expiry_from, AuthorizationStart, TokenLifecycleManager};
use pierre_wellness_sync::logging::{LogFormat, LoggingConfig};
use pierre_wellness_sync::oauth1::{OAuth1Signer, TokenCredentials};
use pierre_wellness_sync::store::{InMemoryPendingAuthStore, InMemoryWellnessStore, WellnessStore as _};
use pierre_wellness_sync::windows::{date_range_to_epoch, split_range};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "wellness-sync",
    about = "Pierre wellness sync CLI",
    long_about = "Authorize, sign, and backfill against wellness APIs that mix OAuth 1.0a and OAuth 2.0."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start an OAuth 2.0 + PKCE authorization and print the consent URL
    Authorize,

    /// Print an OAuth 1.0a Authorization header
    Sign {
        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,

        /// Absolute request URL (query parameters are signed too)
        #[arg(long)]
        url: String,

        /// Extra signed parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// User token for three-legged calls
        #[arg(long, requires = "token_secret")]
        token: Option<String>,

        /// User token secret for three-legged calls
        #[arg(long, requires = "token")]
        token_secret: Option<String>,
    },

    /// Print the request windows covering a date range
    Windows {
        /// First day (inclusive, UTC)
        #[arg(long)]
        start_date: NaiveDate,

        /// Last day (exclusive, UTC)
        #[arg(long)]
        end_date: NaiveDate,

        /// Override the per-request range limit in seconds
        #[arg(long)]
        max_range_seconds: Option<i64>,
    },

    /// Backfill a date range and print the aggregate result as JSON
    Backfill {
        /// OAuth 2.0 access token
        #[arg(long)]
        access_token: String,

        /// Refresh token, enables refresh on expiry or rejection
        #[arg(long)]
        refresh_token: Option<String>,

        /// Seconds until the access token expires
        #[arg(long, default_value = "3600")]
        expires_in: i64,

        /// First day (inclusive, UTC)
        #[arg(long)]
        start_date: NaiveDate,

        /// Last day (exclusive, UTC)
        #[arg(long)]
        end_date: NaiveDate,

        /// Resource path to pull (defaults to BACKFILL_RESOURCE)
        #[arg(long)]
        resource: Option<String>,

        /// Windows in flight at once (1 or 2)
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected key=value, got {raw}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging.level = "debug".to_owned();
        logging.format = LogFormat::Compact;
    }
    logging.init()?;

    initialize_shared_client(HttpClientConfig::from_env());

    match cli.command {
        Command::Authorize => authorize().await,
        Command::Sign {
            method,
            url,
            params,
            token,
            token_secret,
        } => sign(&method, &url, &params, token.zip(token_secret)),
        Command::Windows {
            start_date,
            end_date,
            max_range_seconds,
        } => windows(start_date, end_date, max_range_seconds),
        Command::Backfill {
            access_token,
            refresh_token,
            expires_in,
            start_date,
            end_date,
            resource,
            concurrency,
        } => {
            let mut config = BackfillConfig::from_env();
            if let Some(resource) = resource {
                config.resource = resource;
            }
            if let Some(concurrency) = concurrency {
                config = config.with_window_concurrency(concurrency);
            }
            let token = AccessTokenArgs {
                access_token,
                refresh_token,
                expires_in,
            };
            backfill(token, start_date, end_date, config).await
        }
    }
}

fn load_provider() -> Result<ProviderConfig> {
    let provider = ProviderConfig::garmin_from_env()
        .context("Garmin credentials are required (GARMIN_CLIENT_ID, GARMIN_CLIENT_SECRET)")?;
    provider.validate_and_log();
    Ok(provider)
}

async fn authorize() -> Result<()> {
    let provider = load_provider()?;
    let name = provider.name.clone();
    let manager = TokenLifecycleManager::new(
        Arc::new(InMemoryWellnessStore::new()),
        Arc::new(InMemoryPendingAuthStore::new()),
        shared_client().clone(),
    )
    .with_provider(provider);

    match manager.begin_authorization(&name).await? {
        AuthorizationStart::Redirect {
            authorization_url,
            state,
            code_verifier,
        } => {
            println!("Authorization URL: {authorization_url}");
            println!("State: {state}");
            println!("Code verifier: {code_verifier}");
        }
        AuthorizationStart::Registration {
            state,
            registration_url,
        } => {
            println!("Registration endpoint: {registration_url}");
            println!("State: {state}");
        }
    }
    Ok(())
}

fn sign(
    method: &str,
    url: &str,
    params: &[(String, String)],
    token: Option<(String, String)>,
) -> Result<()> {
    let provider = load_provider()?;
    let Some(consumer) = provider.consumer else {
        bail!("No OAuth 1.0a consumer credentials configured");
    };
    let token = token.map(|(token, token_secret)| TokenCredentials {
        token,
        token_secret,
    });

    let header = OAuth1Signer::new(consumer).sign(method, url, params, token.as_ref())?;
    println!("Authorization: {header}");
    Ok(())
}

fn windows(start_date: NaiveDate, end_date: NaiveDate, max_range_seconds: Option<i64>) -> Result<()> {
    let max_range_seconds = max_range_seconds
        .unwrap_or(pierre_wellness_core::constants::garmin::MAX_RANGE_SECONDS);
    let (start, end) = date_range_to_epoch(start_date, end_date)?;
    for window in split_range(start, end, max_range_seconds)? {
        println!("{}\t{}\t{}s", window.start, window.end, window.duration_secs());
    }
    Ok(())
}

struct AccessTokenArgs {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

async fn backfill(
    token: AccessTokenArgs,
    start_date: NaiveDate,
    end_date: NaiveDate,
    config: BackfillConfig,
) -> Result<()> {
    let provider = load_provider()?;
    let name = provider.name.clone();
    let store = Arc::new(InMemoryWellnessStore::new());
    let lifecycle = Arc::new(
        TokenLifecycleManager::new(
            store.clone(),
            Arc::new(InMemoryPendingAuthStore::new()),
            shared_client().clone(),
        )
        .with_provider(provider),
    );

    // Operator-supplied tokens get a throwaway user id
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    let expires_at = expiry_from(now, Some(token.expires_in))
        .with_context(|| format!("--expires-in {} is out of range", token.expires_in))?;
    let record = AccessTokenRecord {
        user_id,
        provider: name.clone(),
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
        provider_user_id: None,
        scopes: Vec::new(),
        status: ConnectionStatus::Linked,
        connected_at: now,
        last_sync_at: None,
    };
    store.save_token(&record).await?;

    info!(user.id = %user_id, "Running backfill for {name} from {start_date} to {end_date}");
    let orchestrator = BackfillOrchestrator::new(lifecycle, store, config);
    match orchestrator.backfill(user_id, &name, start_date, end_date).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            for failed in result.failed_windows.iter().cloned() {
                warn!("{}", SyncError::from(failed));
            }
            if result.is_complete() {
                Ok(())
            } else {
                bail!(
                    "Backfill incomplete: {} window(s) failed, cancelled={}",
                    result.failed_windows.len(),
                    result.cancelled
                )
            }
        }
        Err(SyncError::AuthorizationError {
            status,
            reason,
            partial,
        }) => {
            println!("{}", serde_json::to_string_pretty(&partial)?);
            bail!("Backfill aborted (status {status:?}): {reason}")
        }
        Err(e) => Err(e.into()),
    }
}
