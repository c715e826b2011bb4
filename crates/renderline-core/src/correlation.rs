// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Correlation cache mapping job ids back to request handles.
//!
//! A request and its terminal outcome are decoupled by an unbounded interval
//! (render queue depth), so entries carry a creation timestamp and a
//! background sweeper discards anything older than the correlation horizon.
//! After a sweep, a late terminal frame for that job falls back to
//! unsolicited delivery.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::{debug, info};

/// A cached association between a job id and the original request.
#[derive(Debug, Clone)]
pub struct CorrelationEntry<H> {
    /// Opaque capability allowing exactly one later edit of the original
    /// acknowledgement message.
    pub handle: H,
    /// User who requested the render.
    pub requested_by_id: String,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

/// In-memory map from job id to the original request.
///
/// At most one live entry exists per job id; insertion overwrites any stale
/// entry for the same id. The lock is held only for a single map mutation,
/// never across I/O.
pub struct CorrelationCache<H> {
    entries: Mutex<HashMap<String, CorrelationEntry<H>>>,
}

impl<H> CorrelationCache<H> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Insert an entry for `share_id`, overwriting any existing one.
    pub fn put(&self, share_id: impl Into<String>, requested_by_id: impl Into<String>, handle: H) {
        let entry = CorrelationEntry {
            handle,
            requested_by_id: requested_by_id.into(),
            created_at: Utc::now(),
        };
        self.lock().insert(share_id.into(), entry);
    }

    /// Atomically read and remove the entry for `share_id`.
    ///
    /// Returns `None` if the entry was already consumed, swept, or never
    /// created.
    pub fn take(&self, share_id: &str) -> Option<CorrelationEntry<H>> {
        self.lock().remove(share_id)
    }

    /// Remove every entry whose age exceeds `horizon` at time `now`.
    pub fn sweep(&self, now: DateTime<Utc>, horizon: Duration) {
        let horizon = chrono::Duration::from_std(horizon).unwrap_or(chrono::Duration::MAX);
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.signed_duration_since(entry.created_at) <= horizon);
        let removed = before - entries.len();
        drop(entries);
        if removed > 0 {
            debug!(removed = removed, "swept expired correlation entries");
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CorrelationEntry<H>>> {
        // A poisoned lock still holds a coherent map; every mutation is a
        // single HashMap call.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H> Default for CorrelationCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the correlation sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to sweep.
    pub interval: Duration,
    /// Maximum age of an entry before it is discarded.
    pub horizon: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            horizon: Duration::from_secs(15 * 60),
        }
    }
}

/// Background task that periodically sweeps a [`CorrelationCache`].
pub struct CorrelationSweeper<H> {
    cache: Arc<CorrelationCache<H>>,
    config: SweeperConfig,
    shutdown: Arc<Notify>,
}

impl<H> CorrelationSweeper<H> {
    /// Create a new sweeper over `cache`.
    pub fn new(cache: Arc<CorrelationCache<H>>, config: SweeperConfig) -> Self {
        Self {
            cache,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the sweep loop until shutdown is signalled.
    pub async fn run(&self) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            horizon_secs = self.config.horizon.as_secs(),
            "Correlation sweeper started"
        );

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!("Correlation sweeper received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.config.interval) => {
                    self.cache.sweep(Utc::now(), self.config.horizon);
                }
            }
        }

        info!("Correlation sweeper stopped");
    }
}
