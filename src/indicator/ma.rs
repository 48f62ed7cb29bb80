use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{ensure_available, ensure_period};

/// Simple Moving Average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period("period", period)?;
        Ok(Self { period })
    }

    /// SMA of each trailing window; one value per full window.
    pub fn calculate_prices(&self, prices: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        ensure_available(self.period, prices.len())?;
        Ok(prices
            .windows(self.period)
            .map(|w| w.iter().sum::<f64>() / self.period as f64)
            .collect())
    }
}
