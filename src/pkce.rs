// ABOUTME: PKCE (RFC 7636) verifier, S256 challenge, and OAuth state generation
// ABOUTME: Stateless helpers; callers persist verifier and state across the redirect
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use pierre_wellness_core::constants::pkce;
use pierre_wellness_core::{SyncError, SyncResult};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Verifier and derived challenge for one authorization attempt
#[derive(Debug, Clone)]
pub struct PkceMaterial {
    /// Random code verifier (43-128 unreserved characters)
    pub code_verifier: String,
    /// base64url(SHA-256(verifier)), unpadded
    pub code_challenge: String,
    /// Always `S256`
    pub code_challenge_method: &'static str,
}

impl PkceMaterial {
    /// Generate fresh material with a 128-character verifier
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = verifier_from_bytes(&random_bytes(pkce::DEFAULT_VERIFIER_LENGTH));
        Self::from_verifier(code_verifier)
    }

    /// Derive the challenge for an existing verifier
    #[must_use]
    pub fn from_verifier(code_verifier: String) -> Self {
        let code_challenge = challenge(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
            code_challenge_method: pkce::CHALLENGE_METHOD,
        }
    }
}

/// Generate a verifier of `length` characters
///
/// Each random byte is mapped into the 66-character unreserved set by modulo, so
/// the first 58 characters are very slightly more likely than the rest.
///
/// # Errors
///
/// Returns `InvalidInput` when `length` is outside 43..=128
pub fn generate_verifier(length: usize) -> SyncResult<String> {
    if !(pkce::MIN_VERIFIER_LENGTH..=pkce::MAX_VERIFIER_LENGTH).contains(&length) {
        return Err(SyncError::invalid_input(format!(
            "PKCE verifier length must be between {} and {}, got {length}",
            pkce::MIN_VERIFIER_LENGTH,
            pkce::MAX_VERIFIER_LENGTH
        )));
    }
    Ok(verifier_from_bytes(&random_bytes(length)))
}

/// S256 challenge: base64url-encoded SHA-256 of the verifier, no padding
#[must_use]
pub fn challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Re-derive the challenge from a stored verifier and compare in constant time
#[must_use]
pub fn verify_challenge(verifier: &str, expected_challenge: &str) -> bool {
    challenge(verifier)
        .as_bytes()
        .ct_eq(expected_challenge.as_bytes())
        .into()
}

/// Opaque single-use state token for CSRF correlation
#[must_use]
pub fn generate_state() -> String {
    Uuid::new_v4().simple().to_string()
}

fn random_bytes(length: usize) -> Vec<u8> {
    let mut bytes = vec![0_u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn verifier_from_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| char::from(pkce::VERIFIER_CHARSET[usize::from(*b) % pkce::VERIFIER_CHARSET.len()]))
        .collect()
}
