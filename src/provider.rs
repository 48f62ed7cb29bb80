pub mod yahoo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::ProviderError;
use crate::model::Interval;
use crate::series::RawFrame;

/// What to fetch: one symbol over a lookback period at a bar interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub symbol: String,
    /// Lookback such as `"180d"` or `"1y"`.
    pub period: String,
    pub interval: Interval,
}

/// Abstraction over a remote source of OHLCV quotes.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn MarketDataProvider`).
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the raw quote frame for `request`. Column naming is whatever the
    /// provider returns; normalization happens during series preparation.
    fn fetch_series<'a>(
        &'a self,
        request: &'a SeriesRequest,
    ) -> BoxFuture<'a, Result<RawFrame, Report<ProviderError>>>;
}
