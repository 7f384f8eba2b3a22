use std::collections::BTreeMap;
use std::time::Duration;

use tracing::info;

use crate::formats::ParsedReport;

/// Statistics gathered over one ingest run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestStats {
    pub lines_read: usize,
    pub records_accepted: usize,
    pub records_rejected: usize,
    pub lines_dropped: usize,
    /// Rejections keyed by reason (`"JSON decode error"` for undecodable lines)
    pub rejections: BTreeMap<String, usize>,
    pub duration: Duration,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally a parsed report produced from `lines_read` raw lines
    pub fn record_parse(&mut self, lines_read: usize, report: &ParsedReport) {
        self.lines_read += lines_read;
        self.records_accepted += report.records.len();
        self.records_rejected += report.errors.len();
        self.lines_dropped += report.dropped;

        for error in &report.errors {
            *self
                .rejections
                .entry(error.reason.label())
                .or_default() += 1;
        }
    }

    /// Share of non-dropped lines that were rejected, as a percentage
    pub fn rejection_rate(&self) -> f64 {
        let considered = self.records_accepted + self.records_rejected;
        if considered == 0 {
            return 0.0;
        }
        self.records_rejected as f64 * 100.0 / considered as f64
    }

    pub fn log_summary(&self) {
        info!(
            lines_read = self.lines_read,
            accepted = self.records_accepted,
            rejected = self.records_rejected,
            dropped = self.lines_dropped,
            duration_ms = self.duration.as_millis() as u64,
            "ingest summary"
        );
        for (reason, count) in &self.rejections {
            info!("  {}: {}", reason, count);
        }
    }
}
