use error_stack::{Report, bail};

use crate::error::TrendError;
use crate::model::{TrendColor, TrendVerdict};
use crate::observer::TrendObserver;
use crate::series::PreparedSeries;

/// Summarize the most recent bar as an Ichimoku cloud position (which sets
/// the color) followed by a Bollinger band position.
///
/// Never fails: an empty series or an uninterpretable last bar gives
/// [`TrendVerdict::fallback`].
pub fn interpret(series: &PreparedSeries, observer: &dyn TrendObserver) -> TrendVerdict {
    observer.on_start(series.len());
    match interpret_last(series) {
        Ok(verdict) => {
            observer.on_verdict(&verdict);
            verdict
        }
        Err(reason) => {
            observer.on_fallback(&reason);
            TrendVerdict::fallback()
        }
    }
}

fn interpret_last(series: &PreparedSeries) -> Result<TrendVerdict, Report<TrendError>> {
    let Some(last) = series.bars().last() else {
        bail!(TrendError::NoBars);
    };
    let close = last.bar.close;
    let ind = &last.indicators;

    for (field, value) in [
        ("close", close),
        ("ichimoku_a", ind.ichimoku_a),
        ("ichimoku_b", ind.ichimoku_b),
        ("bb_upper", ind.bb_upper),
        ("bb_lower", ind.bb_lower),
    ] {
        if !value.is_finite() {
            bail!(TrendError::NonFinite {
                field: field.to_owned(),
            });
        }
    }

    let (cloud, color) = cloud_position(close, ind.ichimoku_a, ind.ichimoku_b);
    let band = band_position(close, ind.bb_upper, ind.bb_lower);

    Ok(TrendVerdict {
        text: [cloud, band].join(" | "),
        color,
    })
}

fn cloud_position(close: f64, span_a: f64, span_b: f64) -> (&'static str, TrendColor) {
    if close > span_a.max(span_b) {
        ("Bullish (price above Ichimoku cloud)", TrendColor::Green)
    } else if close < span_a.min(span_b) {
        ("Bearish (price below Ichimoku cloud)", TrendColor::Red)
    } else {
        ("Neutral (price inside Ichimoku cloud)", TrendColor::Orange)
    }
}

fn band_position(close: f64, upper: f64, lower: f64) -> &'static str {
    if close > upper {
        "Overbought (above upper Bollinger Band)"
    } else if close < lower {
        "Oversold (below lower Bollinger Band)"
    } else {
        "Stable (within Bollinger range)"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::indicator::test_support::bar;
    use crate::model::IndicatorSet;
    use crate::series::PreparedBar;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl TrendObserver for Recorder {
        fn on_start(&self, bars: usize) {
            self.events.lock().unwrap().push(format!("start:{bars}"));
        }

        fn on_verdict(&self, verdict: &TrendVerdict) {
            self.events
                .lock()
                .unwrap()
                .push(format!("verdict:{}", verdict.color));
        }

        fn on_fallback(&self, _reason: &Report<TrendError>) {
            self.events.lock().unwrap().push("fallback".into());
        }
    }

    fn series_ending_with(close: f64, indicators: IndicatorSet) -> PreparedSeries {
        let earlier = PreparedBar {
            bar: bar(0, 1.0, 1.0, 1.0, 1.0),
            indicators: IndicatorSet {
                ichimoku_a: 1000.0,
                ichimoku_b: 1000.0,
                ..indicators
            },
        };
        let last = PreparedBar {
            bar: bar(1, close, close, close, 1.0),
            indicators,
        };
        PreparedSeries::new(vec![earlier, last])
    }

    fn indicators(span_a: f64, span_b: f64) -> IndicatorSet {
        IndicatorSet {
            bb_middle: 100.0,
            bb_upper: 110.0,
            bb_lower: 90.0,
            stoch_k: 50.0,
            stoch_d: 50.0,
            obv: 0.0,
            ichimoku_a: span_a,
            ichimoku_b: span_b,
            ichimoku_base: 100.0,
            ichimoku_conversion: 100.0,
        }
    }

    #[test]
    fn empty_series_returns_exact_fallback() {
        let recorder = Recorder::default();
        let verdict = interpret(&PreparedSeries::empty(), &recorder);
        assert_eq!(
            serde_json::to_value(&verdict).unwrap(),
            serde_json::json!({"text": "No trend interpretation available.", "color": "black"})
        );
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start:0".to_string(), "fallback".to_string()]
        );
    }

    #[test]
    fn above_cloud_is_green_and_overbought() {
        let series = series_ending_with(115.0, indicators(95.0, 105.0));
        let verdict = interpret(&series, &Recorder::default());
        assert_eq!(verdict.color, TrendColor::Green);
        assert_eq!(
            verdict.text,
            "Bullish (price above Ichimoku cloud) | Overbought (above upper Bollinger Band)"
        );
    }

    #[test]
    fn below_cloud_is_red_and_oversold() {
        let series = series_ending_with(85.0, indicators(105.0, 95.0));
        let verdict = interpret(&series, &Recorder::default());
        assert_eq!(verdict.color, TrendColor::Red);
        assert_eq!(
            verdict.text,
            "Bearish (price below Ichimoku cloud) | Oversold (below lower Bollinger Band)"
        );
    }

    #[test]
    fn inside_cloud_is_orange_and_stable() {
        let recorder = Recorder::default();
        let verdict = interpret(&series_ending_with(100.0, indicators(95.0, 105.0)), &recorder);
        assert_eq!(verdict.color, TrendColor::Orange);
        assert_eq!(
            verdict.text,
            "Neutral (price inside Ichimoku cloud) | Stable (within Bollinger range)"
        );
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start:2".to_string(), "verdict:orange".to_string()]
        );
    }

    #[test]
    fn cloud_edge_counts_as_inside() {
        let series = series_ending_with(105.0, indicators(95.0, 105.0));
        let verdict = interpret(&series, &Recorder::default());
        assert_eq!(verdict.color, TrendColor::Orange);
    }

    #[test]
    fn non_finite_last_bar_degrades_to_fallback() {
        let verdict = interpret(
            &series_ending_with(100.0, indicators(f64::NAN, 105.0)),
            &Recorder::default(),
        );
        assert_eq!(verdict, TrendVerdict::fallback());
    }
}
