use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{
    Column, Indicator, align, close_prices, ensure_available, ensure_period, high_prices,
    low_prices, rolling_max, rolling_min,
};
use crate::model::Bar;

/// %K reported for a window whose highest high equals its lowest low.
pub const NEUTRAL_K: f64 = 50.0;

/// Stochastic Oscillator: %K over `period`, %D as the SMA of %K over `smoothing`.
pub struct Stochastic {
    period: usize,
    smoothing: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticColumns {
    pub k: Column,
    pub d: Column,
}

impl Stochastic {
    pub fn new(period: usize, smoothing: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period("period", period)?;
        ensure_period("smoothing", smoothing)?;
        Ok(Self { period, smoothing })
    }

    /// Raw %K, one value per full window.
    pub fn percent_k(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        ensure_available(self.period, bars.len())?;
        let highest = rolling_max(&high_prices(bars), self.period);
        let lowest = rolling_min(&low_prices(bars), self.period);
        let closes = close_prices(bars);

        Ok(closes[self.period - 1..]
            .iter()
            .zip(highest.iter().zip(&lowest))
            .map(|(&close, (&high, &low))| {
                let range = high - low;
                if range == 0.0 {
                    NEUTRAL_K
                } else {
                    100.0 * (close - low) / range
                }
            })
            .collect())
    }
}

impl Indicator for Stochastic {
    type Output = StochasticColumns;

    fn name(&self) -> &str {
        "stochastic"
    }

    fn required_bars(&self) -> usize {
        self.period + self.smoothing - 1
    }

    fn calculate(&self, bars: &[Bar]) -> Result<StochasticColumns, Report<IndicatorError>> {
        ensure_available(self.required_bars(), bars.len())?;
        let k = self.percent_k(bars)?;
        let d = Sma::new(self.smoothing)?.calculate_prices(&k)?;
        Ok(StochasticColumns {
            k: align(bars.len(), k),
            d: align(bars.len(), d),
        })
    }
}
