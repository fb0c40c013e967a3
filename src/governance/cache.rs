// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TTL cache for the decoded, verified governance rules container.
//!
//! The container is read on every address-signature check, so the cache
//! sits in front of "fetch + verify + decode".
//!
//! ## Concurrency
//!
//! - One mutex guards the cached container, its fetch time, and the
//!   in-flight flag; one condition variable signals fetch completion
//! - At most one fetch runs at a time; other callers wait and re-check
//! - The fetch closure always runs with the lock released
//! - The in-flight flag is cleared by a drop guard, so a failed or
//!   panicking fetch still releases the waiters
//! - TTL is measured with [`Instant`] (monotonic)

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::container::DecodedRulesContainer;
use crate::error::{Result, TrustError};

/// Default cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Fetches, verifies and decodes the rules container.
pub type RulesFetcher = dyn Fn() -> Result<DecodedRulesContainer> + Send + Sync;

/// Cache entry. Container and timestamp are always replaced together.
#[derive(Default)]
struct CacheEntry {
    container: Option<Arc<DecodedRulesContainer>>,
    fetched_at: Option<Instant>,
    fetching: bool,
}

impl CacheEntry {
    fn fresh(&self, ttl: Duration) -> Option<Arc<DecodedRulesContainer>> {
        match (&self.container, self.fetched_at) {
            (Some(container), Some(fetched_at)) if fetched_at.elapsed() < ttl => {
                Some(Arc::clone(container))
            }
            _ => None,
        }
    }
}

/// Single-flight TTL cache for [`DecodedRulesContainer`].
pub struct RulesContainerCache {
    ttl: Duration,
    fetch: Box<RulesFetcher>,
    entry: Mutex<CacheEntry>,
    fetch_done: Condvar,
}

impl RulesContainerCache {
    /// Create an empty cache.
    ///
    /// # Errors
    /// `TrustError::Validation` if `ttl` is zero.
    pub fn new<F>(ttl: Duration, fetch: F) -> Result<Self>
    where
        F: Fn() -> Result<DecodedRulesContainer> + Send + Sync + 'static,
    {
        if ttl.is_zero() {
            return Err(TrustError::validation("cache TTL must be positive"));
        }
        Ok(Self {
            ttl,
            fetch: Box::new(fetch),
            entry: Mutex::new(CacheEntry::default()),
            fetch_done: Condvar::new(),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached container, fetching it if missing or expired.
    ///
    /// If another thread is already fetching, wait for it and use its result.
    /// If that fetch failed, this caller attempts its own.
    pub fn get(&self) -> Result<Arc<DecodedRulesContainer>> {
        let mut entry = self.lock_entry();
        loop {
            if let Some(container) = entry.fresh(self.ttl) {
                tracing::trace!("Governance rules cache hit");
                return Ok(container);
            }
            if !entry.fetching {
                break;
            }
            entry = self.wait(entry);
        }

        tracing::debug!(
            cached = entry.container.is_some(),
            "Governance rules cache miss, fetching"
        );
        entry.fetching = true;
        drop(entry);

        self.fetch_and_store()
    }

    /// Force a refresh, waiting out any fetch already in flight.
    pub fn invalidate(&self) -> Result<Arc<DecodedRulesContainer>> {
        let mut entry = self.lock_entry();
        while entry.fetching {
            entry = self.wait(entry);
        }
        entry.fetching = true;
        drop(entry);

        tracing::debug!("Governance rules cache invalidated, fetching");
        self.fetch_and_store()
    }

    /// Whether a cached container exists and is within TTL.
    pub fn is_valid(&self) -> bool {
        self.lock_entry().fresh(self.ttl).is_some()
    }

    /// Drop the cached container. An in-flight fetch still stores its result.
    pub fn clear(&self) {
        let mut entry = self.lock_entry();
        entry.container = None;
        entry.fetched_at = None;
    }

    /// Run the fetch with the lock released. Caller must have set `fetching`.
    fn fetch_and_store(&self) -> Result<Arc<DecodedRulesContainer>> {
        let _in_flight = InFlight { cache: self };

        let container = match (self.fetch)() {
            Ok(container) => Arc::new(container),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh governance rules container");
                return Err(e);
            }
        };

        let mut entry = self.lock_entry();
        entry.container = Some(Arc::clone(&container));
        entry.fetched_at = Some(Instant::now());
        drop(entry);

        tracing::info!(
            users = container.users.len(),
            rules_timestamp = container.timestamp,
            "Governance rules container refreshed"
        );
        Ok(container)
    }

    fn lock_entry(&self) -> MutexGuard<'_, CacheEntry> {
        // Every mutation is a plain field assignment, so a poisoned entry is still consistent.
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, entry: MutexGuard<'a, CacheEntry>) -> MutexGuard<'a, CacheEntry> {
        self.fetch_done
            .wait(entry)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag and wakes waiters when a fetch ends, however it ends.
struct InFlight<'a> {
    cache: &'a RulesContainerCache,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.cache.lock_entry().fetching = false;
        self.cache.fetch_done.notify_all();
    }
}

impl fmt::Debug for RulesContainerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.lock_entry();
        f.debug_struct("RulesContainerCache")
            .field("ttl", &self.ttl)
            .field("cached", &entry.container.is_some())
            .field("fetching", &entry.fetching)
            .finish()
    }
}
