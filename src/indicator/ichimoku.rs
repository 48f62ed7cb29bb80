use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Column, Indicator, align, channel_midpoint, ensure_available, ensure_period};
use crate::model::Bar;

/// Ichimoku Cloud lines built from rolling high/low midpoints.
///
/// Spans A and B are reported at the bar they are computed on; they are not
/// displaced forward in time.
pub struct Ichimoku {
    conversion_period: usize,
    base_period: usize,
    span_b_period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuColumns {
    pub conversion: Column,
    pub base: Column,
    pub span_a: Column,
    pub span_b: Column,
}

impl Ichimoku {
    pub fn new(
        conversion_period: usize,
        base_period: usize,
        span_b_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        ensure_period("conversion_period", conversion_period)?;
        ensure_period("base_period", base_period)?;
        ensure_period("span_b_period", span_b_period)?;
        Ok(Self {
            conversion_period,
            base_period,
            span_b_period,
        })
    }
}

impl Indicator for Ichimoku {
    type Output = IchimokuColumns;

    fn name(&self) -> &str {
        "ichimoku"
    }

    fn required_bars(&self) -> usize {
        self.conversion_period
            .max(self.base_period)
            .max(self.span_b_period)
    }

    fn calculate(&self, bars: &[Bar]) -> Result<IchimokuColumns, Report<IndicatorError>> {
        ensure_available(self.required_bars(), bars.len())?;
        let total = bars.len();

        let conversion = align(total, channel_midpoint(bars, self.conversion_period));
        let base = align(total, channel_midpoint(bars, self.base_period));
        let span_b = align(total, channel_midpoint(bars, self.span_b_period));
        let span_a = conversion
            .iter()
            .zip(&base)
            .map(|(c, b)| Some(((*c)? + (*b)?) / 2.0))
            .collect();

        Ok(IchimokuColumns {
            conversion,
            base,
            span_a,
            span_b,
        })
    }
}
