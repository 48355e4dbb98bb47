//! Download progress reporting

use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress events from the download engine
///
/// Percent events are only emitted when the total size is known up front.
pub trait ProgressReporter: Send {
    fn start(&mut self, _filename: &str, _total_bytes: Option<u64>) {}

    /// Called whenever the whole-percent value changes
    fn advance(&mut self, percent: u8);

    fn finish(&mut self) {}
}

/// Discards all progress events
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn advance(&mut self, _percent: u8) {}
}

/// Terminal progress bar
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl ProgressReporter for BarProgress {
    fn start(&mut self, filename: &str, total_bytes: Option<u64>) {
        let Some(total) = total_bytes else {
            return;
        };
        let style = ProgressStyle::with_template("{msg} [{bar:40}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        let bar = ProgressBar::new(100).with_style(style);
        bar.set_message(format!("Get {} {:.1} MiB", filename, mib(total)));
        self.bar = Some(bar);
    }

    fn advance(&mut self, percent: u8) {
        if let Some(bar) = &self.bar {
            bar.set_position(u64::from(percent));
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

/// Converts a byte count to mebibytes for display
pub fn mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Tracks received bytes against a known total in whole percent
#[derive(Debug)]
pub(crate) struct PercentTracker {
    total: u64,
    received: u64,
    last_percent: Option<u8>,
}

impl PercentTracker {
    pub(crate) fn new(total: u64) -> Self {
        Self {
            total,
            received: 0,
            last_percent: None,
        }
    }

    /// Records `bytes` more and returns the percent if it changed
    pub(crate) fn record(&mut self, bytes: u64) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        self.received += bytes;

        let percent = (self.received.saturating_mul(100) / self.total).min(100) as u8;
        if self.last_percent == Some(percent) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_tracker_reports_only_changes() {
        let mut tracker = PercentTracker::new(200);

        assert_eq!(tracker.record(1), Some(0));
        assert_eq!(tracker.record(0), None);
        assert_eq!(tracker.record(1), Some(1));
        assert_eq!(tracker.record(98), Some(50));
        assert_eq!(tracker.record(100), Some(100));
    }

    #[test]
    fn percent_tracker_caps_at_hundred_when_server_lies() {
        let mut tracker = PercentTracker::new(10);

        assert_eq!(tracker.record(50), Some(100));
        assert_eq!(tracker.record(50), None);
    }

    #[test]
    fn percent_tracker_is_silent_for_zero_total() {
        let mut tracker = PercentTracker::new(0);

        assert_eq!(tracker.record(10), None);
    }

    #[test]
    fn mib_converts_bytes() {
        assert_eq!(mib(3 * 1024 * 1024), 3.0);
    }
}
