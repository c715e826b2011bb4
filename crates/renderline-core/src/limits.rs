// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Admission limits pushed by the control-plane.
//!
//! The control-plane broadcasts the current maximum demo file size in
//! `config` frames. The value is owned by the orchestrator and shared with
//! request-admission code by `Arc`, last-write-wins.

use std::sync::atomic::{AtomicU64, Ordering};

/// Current admission limits for incoming render requests.
#[derive(Debug)]
pub struct AdmissionLimits {
    max_demo_file_size: AtomicU64,
}

impl AdmissionLimits {
    /// Create limits with an initial maximum demo file size in bytes.
    pub fn new(max_demo_file_size: u64) -> Self {
        Self {
            max_demo_file_size: AtomicU64::new(max_demo_file_size),
        }
    }

    /// Replace the maximum demo file size (last-write-wins).
    pub fn set_max_demo_file_size(&self, bytes: u64) {
        self.max_demo_file_size.store(bytes, Ordering::Relaxed);
    }

    /// Current maximum demo file size in bytes.
    pub fn max_demo_file_size(&self) -> u64 {
        self.max_demo_file_size.load(Ordering::Relaxed)
    }

    /// Whether a demo of `len` bytes is admissible.
    pub fn admits(&self, len: u64) -> bool {
        len <= self.max_demo_file_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_value() {
        let limits = AdmissionLimits::new(1024);
        assert_eq!(limits.max_demo_file_size(), 1024);
    }

    #[test]
    fn test_set_is_last_write_wins() {
        let limits = AdmissionLimits::new(1024);
        limits.set_max_demo_file_size(2048);
        limits.set_max_demo_file_size(512);
        assert_eq!(limits.max_demo_file_size(), 512);
    }

    #[test]
    fn test_admits_boundary() {
        let limits = AdmissionLimits::new(100);
        assert!(limits.admits(99));
        assert!(limits.admits(100));
        assert!(!limits.admits(101));
    }
}
