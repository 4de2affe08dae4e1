// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Component statistics tracking and reporting.
//!
//! Throttled to every 10 seconds or 1000 messages, so a busy pipeline isn't
//! slowed down by its own observability.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Runtime statistics for a component, tracking message-processing metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStats {
    /// Total messages received on all input slots.
    pub received: u64,
    /// Total messages published on all output slots.
    pub sent: u64,
    /// Total messages discarded (e.g. an output closed before it could be sent).
    pub discarded: u64,
    /// Total non-fatal processing errors.
    pub errored: u64,
    /// Seconds since the component started, for rate calculation.
    pub duration_secs: f64,
}

impl Default for ComponentStats {
    fn default() -> Self {
        Self {
            received: 0,
            sent: 0,
            discarded: 0,
            errored: 0,
            duration_secs: 0.0,
        }
    }
}

/// A statistics snapshot a component sends to report its current metrics.
#[derive(Debug, Clone)]
pub struct ComponentStatsUpdate {
    pub component_id: String,
    pub stats: ComponentStats,
    pub timestamp: SystemTime,
}

/// Tracks and throttles a component's statistics updates.
pub struct ComponentStatsTracker {
    stats: ComponentStats,
    start_time: std::time::Instant,
    last_send: std::time::Instant,
    component_id: String,
    stats_tx: Option<tokio::sync::mpsc::Sender<ComponentStatsUpdate>>,
}

impl ComponentStatsTracker {
    const SEND_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);
    const SEND_MESSAGE_THRESHOLD: u64 = 1000;

    #[must_use]
    pub fn new(component_id: String, stats_tx: Option<tokio::sync::mpsc::Sender<ComponentStatsUpdate>>) -> Self {
        let now = std::time::Instant::now();
        Self {
            stats: ComponentStats::default(),
            start_time: now,
            last_send: now,
            component_id,
            stats_tx,
        }
    }

    #[inline]
    pub const fn received(&mut self) {
        self.stats.received += 1;
    }

    #[inline]
    pub const fn sent(&mut self) {
        self.stats.sent += 1;
    }

    #[inline]
    pub const fn discarded(&mut self) {
        self.stats.discarded += 1;
    }

    #[inline]
    pub const fn errored(&mut self) {
        self.stats.errored += 1;
    }

    /// Sends a snapshot if the throttling threshold has been reached.
    pub fn maybe_send(&mut self) {
        let should_send = self.last_send.elapsed() >= Self::SEND_INTERVAL
            || self.stats.received.is_multiple_of(Self::SEND_MESSAGE_THRESHOLD);
        if should_send {
            self.force_send();
        }
    }

    /// Sends a snapshot unconditionally (used for a final report on shutdown).
    pub fn force_send(&mut self) {
        if let Some(ref stats_tx) = self.stats_tx {
            self.stats.duration_secs = self.start_time.elapsed().as_secs_f64();
            let _ = stats_tx.try_send(ComponentStatsUpdate {
                component_id: self.component_id.clone(),
                stats: self.stats.clone(),
                timestamp: SystemTime::now(),
            });
            self.last_send = std::time::Instant::now();
        }
    }
}
