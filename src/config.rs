// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the validated [`TrustConfig`]
//! built from them. Loading is optional: every component can also be
//! constructed directly.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GOVERNANCE_RULES_CACHE_TTL_MS` | Lifetime of a cached rules container | `300000` |
//! | `GOVERNANCE_MIN_VALID_SIGNATURES` | SuperAdmin signatures required on the rules container | Required |
//! | `SUPERADMIN_PUBLIC_KEYS_PEM` | Trusted SuperAdmin public keys, concatenated PEM | One of PEM/PATH required |
//! | `SUPERADMIN_PUBLIC_KEYS_PATH` | File containing the same | One of PEM/PATH required |

use std::fs;
use std::time::Duration;

use crate::crypto::keys::{decode_public_key, PublicKey};
use crate::error::{Result, TrustError};
use crate::governance::{
    DecodedRulesContainer, GovernanceRulesVerifier, RulesContainerCache, DEFAULT_CACHE_TTL,
};

/// Environment variable name for the rules cache TTL in milliseconds.
pub const CACHE_TTL_MS_ENV: &str = "GOVERNANCE_RULES_CACHE_TTL_MS";

/// Default rules cache TTL in milliseconds (5 minutes).
pub const DEFAULT_CACHE_TTL_MS: u64 = DEFAULT_CACHE_TTL.as_millis() as u64;

/// Environment variable name for the SuperAdmin signature threshold.
pub const MIN_VALID_SIGNATURES_ENV: &str = "GOVERNANCE_MIN_VALID_SIGNATURES";

/// Environment variable name for inline SuperAdmin public keys.
///
/// Literal `\n` sequences are accepted in place of newlines so the keys fit
/// in a single-line variable.
pub const SUPERADMIN_KEYS_PEM_ENV: &str = "SUPERADMIN_PUBLIC_KEYS_PEM";

/// Environment variable name for a file of SuperAdmin public keys.
///
/// Only read when [`SUPERADMIN_KEYS_PEM_ENV`] is unset.
pub const SUPERADMIN_KEYS_PATH_ENV: &str = "SUPERADMIN_PUBLIC_KEYS_PATH";

/// Validated trust-layer settings.
#[derive(Debug, Clone)]
pub struct TrustConfig {
    cache_ttl: Duration,
    min_valid_signatures: usize,
    trusted_public_keys: Vec<PublicKey>,
}

impl TrustConfig {
    /// # Errors
    /// `TrustError::Validation` if the TTL or threshold is zero, no keys are
    /// given, or the threshold exceeds the number of keys.
    pub fn new(
        cache_ttl: Duration,
        min_valid_signatures: usize,
        trusted_public_keys: Vec<PublicKey>,
    ) -> Result<Self> {
        if cache_ttl.is_zero() {
            return Err(TrustError::validation("cache TTL must be greater than zero"));
        }
        if min_valid_signatures == 0 {
            return Err(TrustError::validation(
                "min_valid_signatures must be greater than zero",
            ));
        }
        if trusted_public_keys.is_empty() {
            return Err(TrustError::validation(
                "at least one trusted SuperAdmin public key is required",
            ));
        }
        if min_valid_signatures > trusted_public_keys.len() {
            return Err(TrustError::validation(format!(
                "min_valid_signatures ({min_valid_signatures}) exceeds the {} trusted keys",
                trusted_public_keys.len()
            )));
        }

        Ok(Self {
            cache_ttl,
            min_valid_signatures,
            trusted_public_keys,
        })
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let ttl_ms = match value(CACHE_TTL_MS_ENV) {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                TrustError::validation(format!("{CACHE_TTL_MS_ENV} is not a number: {e}"))
            })?,
            None => DEFAULT_CACHE_TTL_MS,
        };

        let min_valid_signatures = value(MIN_VALID_SIGNATURES_ENV)
            .ok_or_else(|| TrustError::validation(format!("{MIN_VALID_SIGNATURES_ENV} is required")))?
            .parse::<usize>()
            .map_err(|e| {
                TrustError::validation(format!("{MIN_VALID_SIGNATURES_ENV} is not a number: {e}"))
            })?;

        let keys_pem = match value(SUPERADMIN_KEYS_PEM_ENV) {
            Some(inline) => inline.replace("\\n", "\n"),
            None => {
                let path = value(SUPERADMIN_KEYS_PATH_ENV).ok_or_else(|| {
                    TrustError::validation(format!(
                        "{SUPERADMIN_KEYS_PEM_ENV} or {SUPERADMIN_KEYS_PATH_ENV} is required"
                    ))
                })?;
                fs::read_to_string(&path).map_err(|e| {
                    TrustError::validation(format!("failed to read {path}: {e}"))
                })?
            }
        };

        let trusted_public_keys = parse_public_keys(&keys_pem)?;
        tracing::debug!(
            keys = trusted_public_keys.len(),
            min_valid_signatures,
            ttl_ms,
            "Loaded trust configuration"
        );

        Self::new(
            Duration::from_millis(ttl_ms),
            min_valid_signatures,
            trusted_public_keys,
        )
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn min_valid_signatures(&self) -> usize {
        self.min_valid_signatures
    }

    pub fn trusted_public_keys(&self) -> &[PublicKey] {
        &self.trusted_public_keys
    }

    /// Verifier for the configured threshold and key set.
    pub fn rules_verifier(&self) -> GovernanceRulesVerifier {
        GovernanceRulesVerifier::from_validated(
            self.min_valid_signatures,
            self.trusted_public_keys.clone(),
        )
    }

    /// Rules cache with the configured TTL.
    pub fn rules_cache<F>(&self, fetch: F) -> Result<RulesContainerCache>
    where
        F: Fn() -> Result<DecodedRulesContainer> + Send + Sync + 'static,
    {
        RulesContainerCache::new(self.cache_ttl, fetch)
    }
}

/// Decode every PEM block in `text` as a P-256 public key.
fn parse_public_keys(text: &str) -> Result<Vec<PublicKey>> {
    let blocks = pem::parse_many(text)
        .map_err(|e| TrustError::validation(format!("invalid SuperAdmin key PEM: {e}")))?;
    if blocks.is_empty() {
        return Err(TrustError::validation("no PEM blocks in SuperAdmin keys"));
    }

    blocks
        .iter()
        .map(|block| decode_public_key(&pem::encode(block)))
        .collect()
}
