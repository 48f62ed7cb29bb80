use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ProviderError;
use crate::provider::{MarketDataProvider, SeriesRequest};
use crate::series::{RawColumn, RawFrame};

const PROVIDER: &str = "yahoo";

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Report<ProviderError>> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("forex-signals/", env!("CARGO_PKG_VERSION")))
            .build()
            .change_context(ProviderError::Request {
                provider: PROVIDER.into(),
            })?;
        let base_url = Url::parse(base_url)
            .change_context(ProviderError::Request {
                provider: PROVIDER.into(),
            })
            .attach_with(|| format!("base_url: {base_url}"))?;
        // Unauthenticated endpoint; stay under 2 requests per second.
        let quota = Quota::per_second(nonzero!(2u32));
        Ok(Self {
            client,
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// `{base_url}/v8/finance/chart/{symbol}` with the symbol escaped as a
    /// single path segment.
    fn chart_url(&self, symbol: &str) -> Result<Url, Report<ProviderError>> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Report::new(ProviderError::Request {
                    provider: PROVIDER.into(),
                })
                .attach(format!("base_url cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v8", "finance", "chart"])
            .push(symbol);
        Ok(url)
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn fetch_series<'a>(
        &'a self,
        request: &'a SeriesRequest,
    ) -> BoxFuture<'a, Result<RawFrame, Report<ProviderError>>> {
        Box::pin(async move {
            self.rate_limiter.until_ready().await;

            let url = self.chart_url(&request.symbol)?;
            let params = [
                ("range", request.period.as_str()),
                ("interval", request.interval.as_str()),
            ];

            let response = self
                .client
                .get(url)
                .query(&params)
                .send()
                .await
                .change_context(ProviderError::Request {
                    provider: PROVIDER.into(),
                })
                .attach_with(|| format!("symbol: {}", request.symbol))?;

            if !response.status().is_success() {
                return Err(Report::new(ProviderError::Request {
                    provider: PROVIDER.into(),
                })
                .attach(format!("HTTP status: {}", response.status())));
            }

            let body: ChartResponse =
                response
                    .json()
                    .await
                    .change_context(ProviderError::ResponseParse {
                        provider: PROVIDER.into(),
                    })?;

            let frame = body.into_frame(&request.symbol)?;

            info!(
                symbol = %request.symbol,
                period = %request.period,
                interval = %request.interval,
                fetched = frame.len(),
                "yahoo chart fetch complete"
            );

            Ok(frame)
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    /// Exchange offset from UTC in seconds at request time.
    #[serde(default)]
    gmtoffset: i64,
    /// IANA zone of the exchange, e.g. `Europe/London`.
    #[serde(default)]
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<BTreeMap<String, Vec<Option<f64>>>>,
}

impl ChartResponse {
    fn into_frame(self, symbol: &str) -> Result<RawFrame, Report<ProviderError>> {
        let no_data = || ProviderError::NoData {
            provider: PROVIDER.into(),
            symbol: symbol.to_owned(),
        };

        if let Some(error) = self.chart.error {
            return Err(Report::new(no_data()).attach(format!(
                "{}: {}",
                error.code,
                error.description.unwrap_or_default()
            )));
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Err(Report::new(no_data()));
        };

        let clock = SessionClock::from_meta(&result.meta);
        let index = result
            .timestamp
            .iter()
            .map(|&ts| clock.session_date(ts))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                Report::new(ProviderError::ResponseParse {
                    provider: PROVIDER.into(),
                })
                .attach("timestamp out of range")
            })?;

        let mut frame = RawFrame::new(index);
        if let Some(quote) = result.indicators.quote.into_iter().next() {
            for (name, values) in quote {
                frame = frame.with_column(RawColumn::flat(&name, values));
            }
        }
        Ok(frame)
    }
}

/// Maps bar timestamps (session opens, UTC seconds) to exchange-local
/// calendar dates.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SessionClock {
    /// DST-aware exchange zone.
    Zone(Tz),
    /// Single offset, used when the response names no known zone.
    Fixed(i64),
}

impl SessionClock {
    fn from_meta(meta: &ChartMeta) -> Self {
        let Some(name) = meta.exchange_timezone_name.as_deref() else {
            return Self::Fixed(meta.gmtoffset);
        };
        match name.parse::<Tz>() {
            Ok(tz) => Self::Zone(tz),
            Err(_) => {
                warn!(zone = name, gmtoffset = meta.gmtoffset, "unknown exchange time zone");
                Self::Fixed(meta.gmtoffset)
            }
        }
    }

    fn session_date(self, timestamp: i64) -> Option<NaiveDate> {
        match self {
            Self::Zone(tz) => Utc
                .timestamp_opt(timestamp, 0)
                .single()
                .map(|dt| dt.with_timezone(&tz).date_naive()),
            Self::Fixed(offset) => DateTime::from_timestamp(timestamp.checked_add(offset)?, 0)
                .map(|dt| dt.date_naive()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeriesError;
    use crate::series::normalize;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Fetched in winter (gmtoffset 0). The last two bars open at London
    // midnight during BST, i.e. 23:00Z the previous day.
    const CHART_JSON: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "EURUSD=X",
                    "gmtoffset": 0,
                    "exchangeTimezoneName": "Europe/London"
                },
                "timestamp": [1704672000, 1719788400, 1719874800],
                "indicators": {
                    "quote": [{
                        "open":   [1.0940, 1.0713, null],
                        "high":   [1.0960, 1.0776, 1.0750],
                        "low":    [1.0920, 1.0709, 1.0710],
                        "close":  [1.0941, 1.0713, 1.0740],
                        "volume": [0, 0, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn chart_response_parses_into_frame() {
        let body: ChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        let frame = body.into_frame("EURUSD=X").unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.columns.len(), 5);
    }

    #[test]
    fn winter_fetch_keeps_summer_session_dates() {
        let body: ChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        let frame = body.into_frame("EURUSD=X").unwrap();
        assert_eq!(
            frame.index,
            vec![date(2024, 1, 8), date(2024, 7, 1), date(2024, 7, 2)]
        );
    }

    #[test]
    fn zone_clock_tracks_daylight_saving() {
        let clock = SessionClock::Zone(chrono_tz::Europe::London);
        assert_eq!(clock.session_date(1704672000), Some(date(2024, 1, 8)));
        assert_eq!(clock.session_date(1719788400), Some(date(2024, 7, 1)));
    }

    #[test]
    fn missing_or_unknown_zone_falls_back_to_gmtoffset() {
        let mut meta = ChartMeta {
            gmtoffset: 3600,
            exchange_timezone_name: None,
        };
        assert_eq!(SessionClock::from_meta(&meta), SessionClock::Fixed(3600));
        // 2023-12-31T23:00Z shifted by one hour
        assert_eq!(
            SessionClock::Fixed(3600).session_date(1704063600),
            Some(date(2024, 1, 1))
        );

        meta.exchange_timezone_name = Some("Mars/Olympus_Mons".into());
        assert_eq!(SessionClock::from_meta(&meta), SessionClock::Fixed(3600));
    }

    #[test]
    fn parsed_frame_normalizes_and_drops_null_prices() {
        let body: ChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        let bars = normalize(&body.into_frame("EURUSD=X").unwrap()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].date, date(2024, 7, 1));
        assert_eq!(bars[1].close, 1.0713);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn chart_error_maps_to_no_data() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let err = body.into_frame("NOPE=X").unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProviderError::NoData { symbol, .. } if symbol == "NOPE=X"
        ));
    }

    #[test]
    fn empty_result_surfaces_as_empty_series() {
        let json = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let frame = body.into_frame("EURUSD=X").unwrap();
        assert!(frame.is_empty());
        let err = normalize(&frame).unwrap_err();
        assert!(matches!(err.current_context(), SeriesError::EmptySeries));
    }

    #[test]
    fn chart_url_appends_escaped_symbol() {
        let provider =
            YahooProvider::new("https://query1.finance.yahoo.com/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(provider.name(), "yahoo");
        assert_eq!(
            provider.chart_url("EURUSD=X").unwrap().as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/EURUSD=X"
        );
        assert_eq!(
            provider.chart_url("A/B?x").unwrap().as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/A%2FB%3Fx"
        );
    }

    #[test]
    fn chart_url_keeps_base_path_prefix() {
        let provider =
            YahooProvider::new("http://localhost:8080/proxy/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            provider.chart_url("GBPUSD=X").unwrap().as_str(),
            "http://localhost:8080/proxy/v8/finance/chart/GBPUSD=X"
        );
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(YahooProvider::new("not a url", Duration::from_secs(5)).is_err());
    }
}
