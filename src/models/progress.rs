//! Progress bookkeeping for one resumable upload.

use std::time::{Duration, Instant};

/// Mutable transfer state owned by the upload engine for a single run.
#[derive(Debug)]
pub struct ChunkProgress {
    bytes_transferred: u64,
    total_size: u64,
    started: Instant,
    idle_count: u32,
}

impl ChunkProgress {
    pub fn new(total_size: u64) -> Self {
        Self {
            bytes_transferred: 0,
            total_size,
            started: Instant::now(),
            idle_count: 0,
        }
    }

    /// Record a remote-confirmed byte count.
    ///
    /// Returns `true` and resets the idle count when the count advanced.
    /// A stale or regressing count leaves recorded progress untouched and
    /// bumps the idle count instead.
    pub fn record(&mut self, confirmed: u64) -> bool {
        if confirmed > self.bytes_transferred {
            self.bytes_transferred = confirmed;
            self.idle_count = 0;
            true
        } else {
            self.idle_count += 1;
            false
        }
    }

    /// Count a round-trip that produced no progress. Returns the new count.
    pub fn mark_idle(&mut self) -> u32 {
        self.idle_count += 1;
        self.idle_count
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    pub fn idle_count(&self) -> u32 {
        self.idle_count
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn report(&self) -> ProgressReport {
        ProgressReport {
            bytes_done: self.bytes_transferred,
            total: self.total_size,
            elapsed: self.elapsed(),
        }
    }
}

/// Snapshot handed to progress sinks.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressReport {
    pub bytes_done: u64,
    pub total: u64,
    pub elapsed: Duration,
}

impl ProgressReport {
    /// Whole-number completion percentage. An empty file is 100% done.
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        (self.bytes_done.min(self.total) as u128 * 100 / self.total as u128) as u64
    }

    /// Average throughput since the transfer started, in bytes per second.
    ///
    /// Zero when no time has elapsed yet.
    pub fn avg_bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / secs
    }
}
