use std::cmp::Ordering;

use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Column, Indicator, ensure_available};
use crate::model::Bar;

/// On-Balance Volume: running volume total signed by close direction.
///
/// The first bar starts the total at its own volume. An unchanged close
/// leaves the total as it was.
pub struct OnBalanceVolume;

impl OnBalanceVolume {
    pub fn running_total(bars: &[Bar]) -> Vec<f64> {
        let mut total = 0.0;
        let mut previous_close: Option<f64> = None;
        bars.iter()
            .map(|bar| {
                total += match previous_close.and_then(|prev| bar.close.partial_cmp(&prev)) {
                    None => bar.volume,
                    Some(Ordering::Greater) => bar.volume,
                    Some(Ordering::Less) => -bar.volume,
                    Some(Ordering::Equal) => 0.0,
                };
                previous_close = Some(bar.close);
                total
            })
            .collect()
    }
}

impl Indicator for OnBalanceVolume {
    type Output = Column;

    fn name(&self) -> &str {
        "obv"
    }

    fn required_bars(&self) -> usize {
        1
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Column, Report<IndicatorError>> {
        ensure_available(self.required_bars(), bars.len())?;
        Ok(Self::running_total(bars).into_iter().map(Some).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::bar;

    fn bars(closes_and_volumes: &[(f64, f64)]) -> Vec<Bar> {
        closes_and_volumes
            .iter()
            .enumerate()
            .map(|(i, &(c, v))| bar(i, c, c, c, v))
            .collect()
    }

    #[test]
    fn obv_empty_input_rejected() {
        assert!(OnBalanceVolume.calculate(&[]).is_err());
    }

    #[test]
    fn obv_signed_by_direction() {
        let input = bars(&[(10.0, 100.0), (11.0, 50.0), (10.5, 30.0), (10.5, 70.0), (12.0, 5.0)]);
        let values = OnBalanceVolume.calculate(&input).unwrap();
        assert_eq!(
            values,
            vec![Some(100.0), Some(150.0), Some(120.0), Some(120.0), Some(125.0)]
        );
    }

    #[test]
    fn obv_reproducible_from_raw_input() {
        let input = bars(&[(5.0, 3.0), (4.0, 8.0), (6.0, 2.0), (6.5, 1.0), (6.0, 9.0)]);
        let obv = OnBalanceVolume::running_total(&input);
        for i in 1..input.len() {
            let sign = (input[i].close - input[i - 1].close).signum();
            let sign = if input[i].close == input[i - 1].close { 0.0 } else { sign };
            assert_eq!(obv[i], obv[i - 1] + sign * input[i].volume);
        }
    }

    #[test]
    fn obv_missing_volume_is_zero_flow() {
        let input = bars(&[(1.0, 0.0), (2.0, 0.0), (1.0, 0.0)]);
        let values = OnBalanceVolume::running_total(&input);
        assert_eq!(values, vec![0.0, 0.0, 0.0]);
    }
}
