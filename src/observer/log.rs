use error_stack::Report;

use crate::error::TrendError;
use crate::model::TrendVerdict;
use crate::observer::TrendObserver;

/// Emits trend events as `tracing` records.
pub struct LogObserver;

impl TrendObserver for LogObserver {
    fn on_start(&self, bars: usize) {
        tracing::debug!(bars, "trend interpretation started");
    }

    fn on_verdict(&self, verdict: &TrendVerdict) {
        tracing::info!(
            color = %verdict.color,
            text = %verdict.text,
            "trend interpreted"
        );
    }

    fn on_fallback(&self, reason: &Report<TrendError>) {
        tracing::warn!(error = ?reason, "trend interpretation unavailable, using fallback");
    }
}
