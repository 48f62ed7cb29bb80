pub mod bollinger;
pub mod ichimoku;
pub mod ma;
pub mod obv;
pub mod stochastic;

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::model::Bar;

/// One indicator line aligned with the input bars.
///
/// Position `i` holds the value for bar `i`, or `None` while the trailing
/// window is not yet filled.
pub type Column = Vec<Option<f64>>;

/// A technical analysis indicator that operates on a slice of bars.
///
/// Bars must be in ascending chronological order (oldest first). Every
/// window is trailing: a value only depends on bars at or before its index.
pub trait Indicator: Send + Sync {
    /// Aligned output columns produced by this indicator.
    type Output;

    /// Unique name of this indicator (e.g., "bollinger", "obv").
    fn name(&self) -> &str;

    /// Minimum number of bars required to produce at least one fully
    /// defined output row.
    fn required_bars(&self) -> usize;

    fn calculate(&self, bars: &[Bar]) -> Result<Self::Output, Report<IndicatorError>>;
}

pub fn close_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn high_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

pub fn low_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.low).collect()
}

pub(crate) fn ensure_period(name: &str, period: usize) -> Result<(), Report<IndicatorError>> {
    if period == 0 {
        bail!(IndicatorError::InvalidParameter {
            name: format!("{name} must be > 0"),
        });
    }
    Ok(())
}

pub(crate) fn ensure_available(
    required: usize,
    available: usize,
) -> Result<(), Report<IndicatorError>> {
    if available < required {
        bail!(IndicatorError::InsufficientData {
            required,
            available,
        });
    }
    Ok(())
}

/// Right-align `values` against `total_len` bars, padding the head with `None`.
pub fn align(total_len: usize, values: Vec<f64>) -> Column {
    let offset = total_len.saturating_sub(values.len());
    let mut output = vec![None; total_len];
    for (index, value) in values.into_iter().enumerate() {
        output[offset + index] = Some(value);
    }
    output
}

/// Highest value of each trailing window of `period`.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    values
        .windows(period)
        .map(|w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .collect()
}

/// Lowest value of each trailing window of `period`.
pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    values
        .windows(period)
        .map(|w| w.iter().copied().fold(f64::INFINITY, f64::min))
        .collect()
}

/// Midpoint of the highest high and lowest low over each trailing window.
pub fn channel_midpoint(bars: &[Bar], period: usize) -> Vec<f64> {
    let highs = rolling_max(&high_prices(bars), period);
    let lows = rolling_min(&low_prices(bars), period);
    highs
        .iter()
        .zip(&lows)
        .map(|(&h, &l)| (h + l) / 2.0)
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use crate::model::Bar;

    pub fn day(offset: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(offset as u64)
    }

    pub fn bar(offset: usize, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar {
            date: day(offset),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i, c, c, c, 1.0))
            .collect()
    }
}
