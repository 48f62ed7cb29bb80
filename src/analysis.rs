use error_stack::Report;
use serde::Serialize;

use crate::error::SeriesError;
use crate::model::{Signal, TrendVerdict};
use crate::observer::TrendObserver;
use crate::series::{IndicatorParams, PreparedSeries, RawFrame, prepare};
use crate::strategy::generate_signals;
use crate::trend::interpret;

/// Everything derived from one raw frame: the charting series, the signal
/// list and the trend verdict.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub series: PreparedSeries,
    pub signals: Vec<Signal>,
    pub trend: TrendVerdict,
}

pub fn analyze(
    raw: &RawFrame,
    params: &IndicatorParams,
    observer: &dyn TrendObserver,
) -> Result<Analysis, Report<SeriesError>> {
    let series = prepare(raw, params)?;
    let signals = generate_signals(&series);
    let trend = interpret(&series, observer);
    Ok(Analysis {
        series,
        signals,
        trend,
    })
}
