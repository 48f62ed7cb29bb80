use std::path::Path;
use std::time::Duration;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{Interval, is_valid_period};
use crate::series::IndicatorParams;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_symbol() -> String {
    "EURUSD=X".into()
}

fn default_period() -> String {
    "180d".into()
}

fn default_interval() -> String {
    "1d".into()
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub indicators: IndicatorsConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            period: default_period(),
            interval: default_interval(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MarketConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Indicator windows; any omitted field keeps the conventional value.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IndicatorsConfig {
    pub bollinger_window: usize,
    pub bollinger_std_dev: f64,
    pub stochastic_window: usize,
    pub stochastic_smoothing: usize,
    pub ichimoku_conversion: usize,
    pub ichimoku_base: usize,
    pub ichimoku_span_b: usize,
}

impl Default for IndicatorsConfig {
    fn default() -> Self {
        let params = IndicatorParams::default();
        Self {
            bollinger_window: params.bollinger_window,
            bollinger_std_dev: params.bollinger_std_dev,
            stochastic_window: params.stochastic_window,
            stochastic_smoothing: params.stochastic_smoothing,
            ichimoku_conversion: params.ichimoku_conversion,
            ichimoku_base: params.ichimoku_base,
            ichimoku_span_b: params.ichimoku_span_b,
        }
    }
}

impl From<&IndicatorsConfig> for IndicatorParams {
    fn from(config: &IndicatorsConfig) -> Self {
        Self {
            bollinger_window: config.bollinger_window,
            bollinger_std_dev: config.bollinger_std_dev,
            stochastic_window: config.stochastic_window,
            stochastic_smoothing: config.stochastic_smoothing,
            ichimoku_conversion: config.ichimoku_conversion,
            ichimoku_base: config.ichimoku_base,
            ichimoku_span_b: config.ichimoku_span_b,
        }
    }
}

/// Config file read when `--config` is not given.
pub const DEFAULT_PATH: &str = "config.toml";

/// Load and validate an `AppConfig`.
///
/// With no explicit path, [`DEFAULT_PATH`] is read if present and the
/// built-in defaults are used otherwise. An explicit path must exist.
pub fn load(path: Option<&Path>) -> Result<AppConfig, Report<ConfigError>> {
    match path {
        Some(path) => load_from(path, true),
        None => load_from(Path::new(DEFAULT_PATH), false),
    }
}

fn load_from(path: &Path, required: bool) -> Result<AppConfig, Report<ConfigError>> {
    if !required && !path.exists() {
        let config = AppConfig::default();
        validate(&config)?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

pub(crate) fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_market(config)?;
    validate_indicators(config)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let format = config.general.log_format.as_str();
    if !VALID_LOG_FORMATS.contains(&format) {
        return Err(invalid(format!(
            "general.log_format \"{format}\" is not one of text, json"
        )));
    }
    Ok(())
}

fn validate_market(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let market = &config.market;
    if market.symbol.trim().is_empty() {
        return Err(invalid("market.symbol must not be empty".into()));
    }
    if Interval::parse(&market.interval).is_none() {
        return Err(invalid(format!(
            "market.interval: unknown interval \"{}\"",
            market.interval
        )));
    }
    if !is_valid_period(&market.period) {
        return Err(invalid(format!(
            "market.period: unknown period \"{}\"",
            market.period
        )));
    }
    if market.timeout_secs == 0 {
        return Err(invalid("market.timeout_secs must be > 0".into()));
    }
    Ok(())
}

fn validate_indicators(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let ind = &config.indicators;
    let windows = [
        ("bollinger_window", ind.bollinger_window),
        ("stochastic_window", ind.stochastic_window),
        ("stochastic_smoothing", ind.stochastic_smoothing),
        ("ichimoku_conversion", ind.ichimoku_conversion),
        ("ichimoku_base", ind.ichimoku_base),
        ("ichimoku_span_b", ind.ichimoku_span_b),
    ];
    for (name, window) in windows {
        if window == 0 {
            return Err(invalid(format!("indicators.{name} must be > 0")));
        }
    }
    if ind.bollinger_std_dev.is_nan() || ind.bollinger_std_dev <= 0.0 {
        return Err(invalid("indicators.bollinger_std_dev must be > 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("parse failed")
    }

    #[test]
    fn valid_full_config_parses() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"

[market]
symbol = "GBPUSD=X"
period = "1y"
interval = "1wk"
base_url = "http://localhost:8080"
timeout_secs = 3

[indicators]
bollinger_window = 10
bollinger_std_dev = 2.5
stochastic_window = 5
stochastic_smoothing = 2
ichimoku_conversion = 7
ichimoku_base = 22
ichimoku_span_b = 44
"#;
        let config = parse(toml);
        assert!(validate(&config).is_ok());
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.market.symbol, "GBPUSD=X");
        assert_eq!(config.market.timeout(), Duration::from_secs(3));
        let params = IndicatorParams::from(&config.indicators);
        assert_eq!(params.bollinger_window, 10);
        assert_eq!(params.ichimoku_span_b, 44);
    }

    #[test]
    fn defaults_applied_when_fields_omitted() {
        let config = parse("");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "text");
        assert_eq!(config.market.symbol, "EURUSD=X");
        assert_eq!(config.market.period, "180d");
        assert_eq!(config.market.interval, "1d");
        assert_eq!(config.market.timeout_secs, 10);
        assert_eq!(IndicatorParams::from(&config.indicators), IndicatorParams::default());
    }

    #[test]
    fn partial_indicator_section_keeps_other_defaults() {
        let config = parse("[indicators]\nbollinger_window = 30\n");
        assert_eq!(config.indicators.bollinger_window, 30);
        assert_eq!(config.indicators.ichimoku_span_b, 52);
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let config = load_from(Path::new("/nonexistent/forex-signals.toml"), false).unwrap();
        assert_eq!(config.market.symbol, "EURUSD=X");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load(Some(Path::new("/nonexistent/typo.toml"))).unwrap_err();
        assert!(matches!(err.current_context(), ConfigError::ReadFile));
    }

    #[test]
    fn invalid_interval_rejected() {
        let config = parse("[market]\ninterval = \"1h\"\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn invalid_period_rejected() {
        let config = parse("[market]\nperiod = \"forever\"\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_window_rejected() {
        let config = parse("[indicators]\nstochastic_smoothing = 0\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn non_positive_std_dev_rejected() {
        let config = parse("[indicators]\nbollinger_std_dev = 0.0\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_log_format_rejected() {
        let config = parse("[general]\nlog_format = \"xml\"\n");
        assert!(validate(&config).is_err());
    }
}
