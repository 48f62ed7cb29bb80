pub mod rule;

use tracing::debug;

use crate::model::Signal;
use crate::series::{PreparedBar, PreparedSeries};
use crate::strategy::rule::RULE_ORDER;

/// Upper bound on the signals handed to rendering and export.
pub const MAX_SIGNALS: usize = 50;

/// Final label for one bar: every rule runs in `RULE_ORDER` and the last one
/// that fires wins.
pub fn decide(row: &PreparedBar) -> Option<Signal> {
    let label = RULE_ORDER
        .iter()
        .fold(None, |verdict, rule| rule.evaluate(row).or(verdict))?;
    Some(Signal {
        date: row.bar.date,
        close: row.bar.close,
        label,
    })
}

/// Walk the series oldest first and keep the most recent `MAX_SIGNALS`
/// signals in date order. Bars where no rule fires emit nothing.
pub fn generate_signals(series: &PreparedSeries) -> Vec<Signal> {
    let mut signals: Vec<Signal> = series.iter().filter_map(decide).collect();
    let total = signals.len();
    if total > MAX_SIGNALS {
        signals.drain(..total - MAX_SIGNALS);
    }
    debug!(
        bars = series.len(),
        qualified = total,
        kept = signals.len(),
        "signals generated"
    );
    signals
}
