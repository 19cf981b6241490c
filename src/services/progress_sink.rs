//! Where progress observations go. Purely a side channel; the engine's
//! correctness never depends on a sink.

use crate::models::progress::ProgressReport;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

pub trait ProgressSink: Send + Sync {
    /// Called each time the remote confirms new bytes.
    fn observe(&self, report: &ProgressReport);

    /// Called once when the upload stops, successfully or not.
    fn finish(&self) {}
}

/// Discards every observation.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn observe(&self, _report: &ProgressReport) {}
}

/// Emits progress as `debug` log records.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn observe(&self, report: &ProgressReport) {
        tracing::debug!(
            "Uploaded {}% - ({}/{}) - Avg {}/s",
            report.percent(),
            report.bytes_done,
            report.total,
            HumanBytes(report.avg_bytes_per_sec() as u64)
        );
    }
}

/// Draws a terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {percent:>3}% ({bytes}/{total_bytes}) avg {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn observe(&self, report: &ProgressReport) {
        self.bar.set_length(report.total);
        self.bar.set_position(report.bytes_done);
        self.bar.set_message(format!(
            "{}/s",
            HumanBytes(report.avg_bytes_per_sec() as u64)
        ));
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn bar_tracks_reported_position() {
        let sink = BarProgress::new();
        sink.observe(&ProgressReport {
            bytes_done: 512,
            total: 2048,
            elapsed: Duration::from_secs(1),
        });
        assert_eq!(sink.bar.length(), Some(2048));
        assert_eq!(sink.bar.position(), 512);
        sink.finish();
        assert!(sink.bar.is_finished());
    }
}
