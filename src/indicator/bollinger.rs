use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{Column, Indicator, align, close_prices, ensure_available, ensure_period};
use crate::model::Bar;

/// Bollinger Bands around a simple moving average of close.
///
/// Band width uses the population standard deviation (divide by `period`),
/// so a window of identical closes gives zero-width bands.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerColumns {
    pub middle: Column,
    pub upper: Column,
    pub lower: Column,
}

/// One window's envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        ensure_period("period", period)?;
        if std_dev_multiplier.is_nan() || std_dev_multiplier <= 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: format!("std_dev_multiplier must be > 0, got {std_dev_multiplier}"),
            });
        }
        Ok(Self {
            period,
            std_dev_multiplier,
        })
    }

    /// One envelope per full trailing window of closes.
    pub fn envelopes(&self, bars: &[Bar]) -> Result<Vec<Band>, Report<IndicatorError>> {
        let closes = close_prices(bars);
        ensure_available(self.period, closes.len())?;

        let means = Sma::new(self.period)?.calculate_prices(&closes)?;
        Ok(closes
            .windows(self.period)
            .zip(means)
            .map(|(window, middle)| {
                let width = self.std_dev_multiplier * population_std_dev(window, middle);
                Band {
                    upper: middle + width,
                    middle,
                    lower: middle - width,
                }
            })
            .collect())
    }
}

fn population_std_dev(window: &[f64], mean: f64) -> f64 {
    let sum_sq: f64 = window.iter().map(|&p| (p - mean) * (p - mean)).sum();
    (sum_sq / window.len() as f64).sqrt()
}

impl Indicator for BollingerBands {
    type Output = BollingerColumns;

    fn name(&self) -> &str {
        "bollinger"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Result<BollingerColumns, Report<IndicatorError>> {
        let envelopes = self.envelopes(bars)?;
        let total = bars.len();
        let pick = |f: fn(&Band) -> f64| align(total, envelopes.iter().map(f).collect());
        Ok(BollingerColumns {
            middle: pick(|b| b.middle),
            upper: pick(|b| b.upper),
            lower: pick(|b| b.lower),
        })
    }
}
