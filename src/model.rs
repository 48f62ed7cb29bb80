use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Bar interval supported by the application.
///
/// Only intervals with one bar per calendar date are accepted, so bar dates
/// stay unique. String representations match the config file format and the
/// provider query parameter (e.g. `"1d"`, `"1wk"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Day1,
    Week1,
    Month1,
}

impl Interval {
    /// Parse a config-format string into an `Interval`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1d" => Some(Self::Day1),
            "1wk" => Some(Self::Week1),
            "1mo" => Some(Self::Month1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day1 => "1d",
            Self::Week1 => "1wk",
            Self::Month1 => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether `s` is a lookback period the quote provider understands:
/// `<n>d`, `<n>wk`, `<n>mo`, `<n>y`, `ytd` or `max`.
pub fn is_valid_period(s: &str) -> bool {
    if s == "ytd" || s == "max" {
        return true;
    }
    let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (count, unit) = s.split_at(digits_end);
    let count_ok = count.parse::<u32>().is_ok_and(|n| n > 0);
    count_ok && matches!(unit, "d" | "wk" | "mo" | "y")
}

/// One OHLCV time step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Indicator values attached to a prepared bar. Every field is defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub bb_middle: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub obv: f64,
    pub ichimoku_a: f64,
    pub ichimoku_b: f64,
    pub ichimoku_base: f64,
    pub ichimoku_conversion: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalLabel {
    BollingerBreakout,
    BollingerRebound,
    StochasticBuy,
    StochasticSell,
    IchimokuBuy,
    IchimokuSell,
}

impl SignalLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BollingerBreakout => "SELL (Bollinger breakout)",
            Self::BollingerRebound => "BUY (Bollinger rebound)",
            Self::StochasticBuy => "BUY (Stochastic)",
            Self::StochasticSell => "SELL (Stochastic)",
            Self::IchimokuBuy => "BUY (Ichimoku trend)",
            Self::IchimokuSell => "SELL (Ichimoku trend)",
        }
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SignalLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A discrete trading signal emitted for one bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub date: NaiveDate,
    pub close: f64,
    pub label: SignalLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendColor {
    Green,
    Red,
    Orange,
    Black,
}

impl fmt::Display for TrendColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Red => write!(f, "red"),
            Self::Orange => write!(f, "orange"),
            Self::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendVerdict {
    pub text: String,
    pub color: TrendColor,
}

impl TrendVerdict {
    pub const FALLBACK_TEXT: &'static str = "No trend interpretation available.";

    /// Verdict reported when the last bar cannot be interpreted.
    pub fn fallback() -> Self {
        Self {
            text: Self::FALLBACK_TEXT.to_owned(),
            color: TrendColor::Black,
        }
    }
}
