use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ProviderError {
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
    #[display("{provider} returned no data for {symbol}")]
    NoData { provider: String, symbol: String },
}

/// Failures while turning a raw frame into a prepared series.
#[derive(Debug, Display, Error)]
pub enum SeriesError {
    #[display("no data available")]
    EmptySeries,
    #[display("missing column: {name}")]
    MissingColumn { name: String },
    #[display("column {name} has {got} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[display("indicator computation failed")]
    Indicator,
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum TrendError {
    #[display("series has no bars")]
    NoBars,
    #[display("non-finite value in {field}")]
    NonFinite { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ExportError {
    #[display("failed to write export")]
    Write,
    #[display("failed to serialize export")]
    Serialize,
}
