pub mod log;

use error_stack::Report;

use crate::error::TrendError;
use crate::model::TrendVerdict;

/// Sink for trend interpretation events.
pub trait TrendObserver: Send + Sync {
    fn on_start(&self, bars: usize);

    fn on_verdict(&self, verdict: &TrendVerdict);

    fn on_fallback(&self, reason: &Report<TrendError>);
}
