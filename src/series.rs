use std::collections::BTreeMap;

use chrono::NaiveDate;
use error_stack::{Report, ResultExt, bail};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::SeriesError;
use crate::indicator::Indicator;
use crate::indicator::bollinger::BollingerBands;
use crate::indicator::ichimoku::Ichimoku;
use crate::indicator::obv::OnBalanceVolume;
use crate::indicator::stochastic::Stochastic;
use crate::model::{Bar, IndicatorSet};

/// One column of a raw quote frame.
///
/// `key` holds every level of the column label, outermost first. Flat frames
/// have a single level; multi-level frames carry e.g. `["Close", "EURUSD=X"]`.
#[derive(Debug, Clone)]
pub struct RawColumn {
    pub key: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl RawColumn {
    pub fn flat(name: &str, values: Vec<Option<f64>>) -> Self {
        Self {
            key: vec![name.to_owned()],
            values,
        }
    }

    /// Canonical OHLCV field this column holds, if any. Only the outermost
    /// label level is considered and case is ignored.
    fn field(&self) -> Option<Field> {
        self.key.first().and_then(|name| Field::from_label(name))
    }
}

/// Raw OHLCV input as delivered by a quote provider, indexed by date.
#[derive(Debug, Clone, Default)]
pub struct RawFrame {
    pub index: Vec<NaiveDate>,
    pub columns: Vec<RawColumn>,
}

impl RawFrame {
    pub fn new(index: Vec<NaiveDate>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: RawColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    const PRICES: [Field; 4] = [Field::Open, Field::High, Field::Low, Field::Close];

    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "high" => Some(Self::High),
            "low" => Some(Self::Low),
            "close" => Some(Self::Close),
            "volume" => Some(Self::Volume),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
        }
    }
}

/// Window sizes for the four indicator families.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub bollinger_window: usize,
    pub bollinger_std_dev: f64,
    pub stochastic_window: usize,
    pub stochastic_smoothing: usize,
    pub ichimoku_conversion: usize,
    pub ichimoku_base: usize,
    pub ichimoku_span_b: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            bollinger_window: 20,
            bollinger_std_dev: 2.0,
            stochastic_window: 14,
            stochastic_smoothing: 3,
            ichimoku_conversion: 9,
            ichimoku_base: 26,
            ichimoku_span_b: 52,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedBar {
    #[serde(flatten)]
    pub bar: Bar,
    #[serde(flatten)]
    pub indicators: IndicatorSet,
}

/// Dense, date-ascending bars where every indicator value is defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PreparedSeries {
    bars: Vec<PreparedBar>,
}

impl PreparedSeries {
    pub fn new(bars: Vec<PreparedBar>) -> Self {
        Self { bars }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[PreparedBar] {
        &self.bars
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreparedBar> {
        self.bars.iter()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Normalize a raw frame, compute every indicator and keep only fully
/// populated rows.
///
/// A frame with zero rows is an error. A frame too short for the longest
/// indicator window yields an empty series.
pub fn prepare(
    raw: &RawFrame,
    params: &IndicatorParams,
) -> Result<PreparedSeries, Report<SeriesError>> {
    let bars = normalize(raw)?;

    let bollinger = BollingerBands::new(params.bollinger_window, params.bollinger_std_dev)
        .change_context(SeriesError::Indicator)?;
    let stochastic = Stochastic::new(params.stochastic_window, params.stochastic_smoothing)
        .change_context(SeriesError::Indicator)?;
    let ichimoku = Ichimoku::new(
        params.ichimoku_conversion,
        params.ichimoku_base,
        params.ichimoku_span_b,
    )
    .change_context(SeriesError::Indicator)?;
    let obv = OnBalanceVolume;

    let required = [
        bollinger.required_bars(),
        stochastic.required_bars(),
        ichimoku.required_bars(),
        obv.required_bars(),
    ]
    .into_iter()
    .max()
    .unwrap_or(1);

    if bars.len() < required {
        debug!(
            available = bars.len(),
            required, "series shorter than longest indicator window"
        );
        return Ok(PreparedSeries::empty());
    }

    let bb = bollinger
        .calculate(&bars)
        .change_context(SeriesError::Indicator)
        .attach_with(|| format!("indicator: {}", bollinger.name()))?;
    let stoch = stochastic
        .calculate(&bars)
        .change_context(SeriesError::Indicator)
        .attach_with(|| format!("indicator: {}", stochastic.name()))?;
    let volume_flow = obv
        .calculate(&bars)
        .change_context(SeriesError::Indicator)
        .attach_with(|| format!("indicator: {}", obv.name()))?;
    let cloud = ichimoku
        .calculate(&bars)
        .change_context(SeriesError::Indicator)
        .attach_with(|| format!("indicator: {}", ichimoku.name()))?;

    let total = bars.len();
    let prepared: Vec<PreparedBar> = bars
        .into_iter()
        .enumerate()
        .filter_map(|(i, bar)| {
            let indicators = IndicatorSet {
                bb_middle: bb.middle[i]?,
                bb_upper: bb.upper[i]?,
                bb_lower: bb.lower[i]?,
                stoch_k: stoch.k[i]?,
                stoch_d: stoch.d[i]?,
                obv: volume_flow[i]?,
                ichimoku_a: cloud.span_a[i]?,
                ichimoku_b: cloud.span_b[i]?,
                ichimoku_base: cloud.base[i]?,
                ichimoku_conversion: cloud.conversion[i]?,
            };
            Some(PreparedBar { bar, indicators })
        })
        .collect();

    debug!(
        bars = total,
        prepared = prepared.len(),
        "prepared series with full indicator coverage"
    );

    Ok(PreparedSeries::new(prepared))
}

/// Map raw columns onto canonical bars, sorted by date with unique dates.
///
/// Rows missing any price are dropped. A missing volume column or a null
/// volume is read as zero.
pub fn normalize(raw: &RawFrame) -> Result<Vec<Bar>, Report<SeriesError>> {
    if raw.is_empty() {
        bail!(SeriesError::EmptySeries);
    }

    let rows = raw.len();
    let mut found: BTreeMap<&'static str, &[Option<f64>]> = BTreeMap::new();
    for column in &raw.columns {
        let Some(field) = column.field() else {
            continue;
        };
        if column.values.len() != rows {
            bail!(SeriesError::LengthMismatch {
                name: column.key.join("/"),
                expected: rows,
                got: column.values.len(),
            });
        }
        if found.contains_key(field.as_str()) {
            warn!(column = %column.key.join("/"), "duplicate column for field, keeping first");
            continue;
        }
        found.insert(field.as_str(), &column.values);
    }

    for field in Field::PRICES {
        if !found.contains_key(field.as_str()) {
            bail!(SeriesError::MissingColumn {
                name: field.as_str().to_owned(),
            });
        }
    }

    let value = |field: Field, row: usize| found.get(field.as_str()).and_then(|c| c[row]);

    // BTreeMap keyed by date sorts ascending; a repeated date keeps the last row.
    let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
    let mut incomplete = 0usize;
    for (row, &date) in raw.index.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            value(Field::Open, row),
            value(Field::High, row),
            value(Field::Low, row),
            value(Field::Close, row),
        ) else {
            incomplete += 1;
            continue;
        };
        let volume = value(Field::Volume, row).unwrap_or(0.0);
        by_date.insert(
            date,
            Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            },
        );
    }

    if incomplete > 0 {
        debug!(rows = incomplete, "dropped rows with missing prices");
    }
    let duplicates = rows - incomplete - by_date.len();
    if duplicates > 0 {
        warn!(rows = duplicates, "duplicate dates in raw frame, kept last");
    }

    Ok(by_date.into_values().collect())
}
